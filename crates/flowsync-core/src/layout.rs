//! Placement of newly imported process groups

use tracing::{debug, instrument};

use flowsync_interfaces::{ApiResult, FlowApi, FlowContents, Position};

/// Canvas width of a process group box
pub const GROUP_WIDTH: i64 = 380;

/// Horizontal gap left between the existing components and a new group
pub const GROUP_SPACING: i64 = 50;

/// Position right of the bounding box of `contents`, aligned with its top.
///
/// An empty canvas yields the origin. Server coordinates are fractional and
/// are rounded to the nearest integer. Coordinates beyond the `i64` range
/// clamp to its bounds.
pub fn position_beside(contents: &FlowContents) -> Position {
    let bounds = contents.positions().fold(None::<(f64, f64)>, |bounds, pos| {
        Some(match bounds {
            None => (pos.x, pos.y),
            Some((right, top)) => (f64::max(right, pos.x), f64::min(top, pos.y)),
        })
    });

    match bounds {
        None => Position::origin(),
        Some((right, top)) => Position::new(
            (right.round() as i64).saturating_add(GROUP_WIDTH + GROUP_SPACING),
            top.round() as i64,
        ),
    }
}

/// Suggests where to put a new group inside `parent_id`
#[instrument(skip(api))]
pub async fn suggest_position(api: &dyn FlowApi, parent_id: &str) -> ApiResult<Position> {
    let contents = api.list_components(parent_id).await?;
    let position = position_beside(&contents);
    debug!(%position, components = contents.components().count(), "Suggested position");
    Ok(position)
}
