//! Breadth-first search over the process-group tree

use std::collections::VecDeque;

use futures::{pin_mut, Stream, TryStreamExt};
use tracing::{debug, instrument};

use flowsync_interfaces::{ApiResult, FlowApi, ProcessGroupFlow};

/// Lazily walks the tree below `root_id`, breadth first.
///
/// Each visited group costs one `get_flow` call; its children are queued in
/// server-reported order. The first failed read ends the stream.
pub fn traverse<'a>(
    api: &'a dyn FlowApi,
    root_id: &str,
) -> impl Stream<Item = ApiResult<ProcessGroupFlow>> + 'a {
    let pending = VecDeque::from([root_id.to_string()]);
    futures::stream::try_unfold(pending, move |pending| visit_next(api, pending))
}

async fn visit_next(
    api: &dyn FlowApi,
    mut pending: VecDeque<String>,
) -> ApiResult<Option<(ProcessGroupFlow, VecDeque<String>)>> {
    let Some(group_id) = pending.pop_front() else {
        return Ok(None);
    };

    let group = api.get_flow(&group_id).await?;
    pending.extend(group.child_group_ids().map(str::to_string));
    Ok(Some((group, pending)))
}

/// Finds the shallowest group whose display name equals `name` exactly.
///
/// Among groups at the same depth the first one queued wins, which follows
/// the order the server lists children in.
#[instrument(skip(api))]
pub async fn find_by_name(
    api: &dyn FlowApi,
    root_id: &str,
    name: &str,
) -> ApiResult<Option<ProcessGroupFlow>> {
    let groups = traverse(api, root_id);
    pin_mut!(groups);

    let mut visited = 0usize;
    while let Some(group) = groups.try_next().await? {
        visited += 1;
        if group.name() == name {
            debug!(group_id = %group.id, visited, "Found process group");
            return Ok(Some(group));
        }
    }

    debug!(visited, "No process group with that name");
    Ok(None)
}
