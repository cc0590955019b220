//! Import-or-upgrade decision for a named process group

use std::sync::Arc;

use tracing::{debug, info, instrument};

use flowsync_interfaces::{
    Bucket, FlowApi, Position, ProcessGroupEntity, RegistryApi, RegistryClientEntity,
    VersionedFlow,
};

use crate::error::{DeployError, DeployResult, ResourceKind};
use crate::import::{import_group, ImportRequest};
use crate::layout::suggest_position;
use crate::progress::{ProgressObserver, TracingProgress};
use crate::resolver::find_by_name;
use crate::version_change::{change_version, PollSettings};

/// Names used only when the group has to be imported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportParams {
    /// Registry bucket name
    pub bucket: Option<String>,
    /// Flow name inside the bucket
    pub flow: Option<String>,
    /// Parent group name, the root when absent
    pub parent: Option<String>,
    /// Registry connection name, required when several are configured
    pub registry: Option<String>,
    /// Explicit position, computed from the parent's canvas when absent
    pub position: Option<Position>,
}

impl ImportParams {
    /// Bucket and flow names, or the configuration error naming what is
    /// missing. Empty strings count as missing.
    fn source(&self) -> DeployResult<(&str, &str)> {
        match (non_empty(&self.bucket), non_empty(&self.flow)) {
            (Some(bucket), Some(flow)) => Ok((bucket, flow)),
            _ => Err(DeployError::Config(
                "Importing Process Group needs --bucket and --flow defined".to_string(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// What a reconciliation did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The existing group was moved to `version`
    Upgraded {
        /// Group id
        group_id: String,
        /// Version now deployed
        version: i64,
    },
    /// A new group was created
    Imported {
        /// The created and renamed group
        group: ProcessGroupEntity,
    },
}

impl Outcome {
    /// Id of the reconciled group
    pub fn group_id(&self) -> &str {
        match self {
            Outcome::Upgraded { group_id, .. } => group_id,
            Outcome::Imported { group } => &group.id,
        }
    }
}

/// Reconciles named process groups against registry versions
#[derive(Clone)]
pub struct Reconciler {
    flow: Arc<dyn FlowApi>,
    registry: Arc<dyn RegistryApi>,
    observer: Arc<dyn ProgressObserver>,
    poll: PollSettings,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler that logs progress and polls with the default
    /// settings
    pub fn new(flow: Arc<dyn FlowApi>, registry: Arc<dyn RegistryApi>) -> Self {
        Self {
            flow,
            registry,
            observer: Arc::new(TracingProgress),
            poll: PollSettings::default(),
        }
    }

    /// Replaces the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the poll settings
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Upgrades the group called `name` to `version`, or imports it when no
    /// group has that name.
    ///
    /// An existing group always wins: `params` is neither read nor checked
    /// in that case.
    #[instrument(skip(self, params))]
    pub async fn reconcile(
        &self,
        name: &str,
        version: i64,
        params: &ImportParams,
    ) -> DeployResult<Outcome> {
        let root_id = self.flow.get_root_flow().await?.id;

        if let Some(existing) = find_by_name(self.flow.as_ref(), &root_id, name).await? {
            info!(group_id = %existing.id, "Process group exists, upgrading");
            let group_id = change_version(
                self.flow.as_ref(),
                &existing.id,
                version,
                &self.poll,
                self.observer.as_ref(),
            )
            .await?;
            return Ok(Outcome::Upgraded { group_id, version });
        }

        info!("Process group does not exist, importing");
        let request = self.resolve_import(name, version, params, &root_id).await?;
        let group = import_group(self.flow.as_ref(), &request).await?;
        Ok(Outcome::Imported { group })
    }

    async fn resolve_import(
        &self,
        name: &str,
        version: i64,
        params: &ImportParams,
        root_id: &str,
    ) -> DeployResult<ImportRequest> {
        let (bucket_name, flow_name) = params.source()?;

        let bucket = self.find_bucket(bucket_name).await?;
        let flow = self.find_flow(&bucket, flow_name).await?;
        let registry_id = self.select_registry(non_empty(&params.registry)).await?;

        let parent_id = match non_empty(&params.parent) {
            Some(parent) => find_by_name(self.flow.as_ref(), root_id, parent)
                .await?
                .map(|group| group.id)
                .ok_or_else(|| DeployError::NotFound {
                    kind: ResourceKind::ParentGroup,
                    name: parent.to_string(),
                })?,
            None => root_id.to_string(),
        };

        let position = match params.position {
            Some(position) => position,
            None => suggest_position(self.flow.as_ref(), &parent_id).await?,
        };

        Ok(ImportRequest {
            name: name.to_string(),
            parent_id,
            registry_id,
            bucket_id: bucket.identifier,
            flow_id: flow.identifier,
            version,
            position,
        })
    }

    async fn find_bucket(&self, name: &str) -> DeployResult<Bucket> {
        let buckets = self.registry.list_buckets().await?;
        debug!(count = buckets.len(), "Listed buckets");
        buckets
            .into_iter()
            .find(|bucket| bucket.name == name)
            .ok_or_else(|| DeployError::NotFound {
                kind: ResourceKind::Bucket,
                name: name.to_string(),
            })
    }

    async fn find_flow(&self, bucket: &Bucket, name: &str) -> DeployResult<VersionedFlow> {
        let flows = self.registry.list_flows(&bucket.identifier).await?;
        debug!(bucket_id = %bucket.identifier, count = flows.len(), "Listed flows");
        flows
            .into_iter()
            .find(|flow| flow.name == name)
            .ok_or_else(|| DeployError::NotFound {
                kind: ResourceKind::Flow,
                name: name.to_string(),
            })
    }

    /// Registry connection by name, or the only configured one
    async fn select_registry(&self, name: Option<&str>) -> DeployResult<String> {
        let registries = self.flow.list_registry_connections().await?;
        match name {
            Some(name) => registries
                .into_iter()
                .find(|registry| registry.name() == name)
                .map(|registry| registry.id)
                .ok_or_else(|| DeployError::NotFound {
                    kind: ResourceKind::RegistryClient,
                    name: name.to_string(),
                }),
            None => only_registry(registries),
        }
    }
}

fn only_registry(registries: Vec<RegistryClientEntity>) -> DeployResult<String> {
    let count = registries.len();
    let mut registries = registries.into_iter();
    match (registries.next(), count) {
        (Some(registry), 1) => Ok(registry.id),
        _ => Err(DeployError::Config(format!(
            "Import Process Group: must provide registry client if clients are not unique ({} configured)",
            count
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressEvent, RecordingObserver};
    use flowsync_test_utils::{
        init_test_tracing, FakeFlowServer, MockFlowApi, MockRegistryApi, Mutation, ROOT_ID,
    };
    use pretty_assertions::assert_eq;

    struct Fixture {
        server: Arc<FakeFlowServer>,
        observer: Arc<RecordingObserver>,
        reconciler: Reconciler,
    }

    fn fixture(server: FakeFlowServer) -> Fixture {
        init_test_tracing();
        let server = Arc::new(server);
        let observer = Arc::new(RecordingObserver::new());
        let reconciler = Reconciler::new(server.clone(), server.clone())
            .with_observer(observer.clone());
        Fixture {
            server,
            observer,
            reconciler,
        }
    }

    /// A server with one registry connection, a bucket holding "test flow",
    /// and an existing versioned group "nested 123456" under "test group".
    fn populated_server() -> FakeFlowServer {
        let server = FakeFlowServer::new();
        let registry = server.add_registry_client("docker local");
        let bucket = server.add_bucket("docker local test");
        let flow = server.add_flow(&bucket, "test flow");
        let parent = server.add_group(ROOT_ID, "test group");
        server.add_versioned_group(&parent, "nested 123456", &registry, &bucket, &flow, 1);
        server
    }

    fn import_params() -> ImportParams {
        ImportParams {
            bucket: Some("docker local test".to_string()),
            flow: Some("test flow".to_string()),
            ..ImportParams::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_group_is_upgraded_ignoring_import_params() {
        let f = fixture(populated_server());
        let existing = f.server.groups_named("nested 123456")[0].clone();
        let params = ImportParams {
            bucket: Some("no such bucket".to_string()),
            flow: None,
            parent: Some("no such parent".to_string()),
            registry: Some("no such registry".to_string()),
            position: None,
        };

        let outcome = f.reconciler.reconcile("nested 123456", 2, &params).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Upgraded {
                group_id: existing.clone(),
                version: 2,
            }
        );
        assert_eq!(
            f.server.mutations(),
            vec![Mutation::ChangeVersion {
                group_id: existing.clone(),
                revision: 0,
                version: 2,
            }]
        );
        assert_eq!(f.server.call_count("list_buckets"), 0);
        assert_eq!(f.server.call_count("list_registry_connections"), 0);
        assert_eq!(
            f.observer.events().last(),
            Some(&ProgressEvent::Completed(existing))
        );
    }

    #[tokio::test]
    async fn test_missing_group_is_imported_beside_siblings() {
        let server = populated_server();
        let sibling = server.groups_named("test group")[0].clone();
        server.place_group(&sibling, 60.0, 10.0);
        server.add_component(ROOT_ID, 10.0, 5.0);
        server.add_component(ROOT_ID, 100.0, 20.0);
        server.add_component(ROOT_ID, 50.0, 2.0);
        let f = fixture(server);

        let outcome = f.reconciler.reconcile("fresh", 3, &import_params()).await.unwrap();

        let Outcome::Imported { group } = &outcome else {
            panic!("expected import, got {:?}", outcome);
        };
        assert_eq!(group.name(), "fresh");
        assert_eq!(group.component.parent_group_id.as_deref(), Some(ROOT_ID));
        assert_eq!(group.current_version(), Some(3));

        match &f.server.mutations()[0] {
            Mutation::CreateGroup {
                parent_id,
                version_info,
                position,
                ..
            } => {
                assert_eq!(parent_id, ROOT_ID);
                assert_eq!(*position, Position::new(530, 2));
                assert_eq!(version_info.version, 3);
            }
            other => panic!("unexpected mutation {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_import_into_named_parent_with_explicit_position() {
        let f = fixture(populated_server());
        let parent = f.server.groups_named("test group")[0].clone();
        let params = ImportParams {
            parent: Some("test group".to_string()),
            registry: Some("docker local".to_string()),
            position: Some(Position::new(-40, 80)),
            ..import_params()
        };

        let outcome = f.reconciler.reconcile("fresh", 1, &params).await.unwrap();

        assert_eq!(outcome.group_id(), f.server.groups_named("fresh")[0]);
        assert!(matches!(
            &f.server.mutations()[0],
            Mutation::CreateGroup { parent_id, position, .. }
                if parent_id == &parent && *position == Position::new(-40, 80)
        ));
        assert_eq!(f.server.call_count("list_components"), 0);
    }

    #[tokio::test]
    async fn test_missing_bucket_or_flow_is_a_config_error_before_any_call() {
        for params in [
            ImportParams::default(),
            ImportParams {
                bucket: Some("docker local test".to_string()),
                ..ImportParams::default()
            },
            ImportParams {
                flow: Some("test flow".to_string()),
                bucket: Some(String::new()),
                ..ImportParams::default()
            },
        ] {
            let f = fixture(populated_server());
            let err = f.reconciler.reconcile("fresh", 1, &params).await.unwrap_err();
            assert!(err.is_config(), "unexpected error {:?}", err);
            assert_eq!(f.server.call_count("list_buckets"), 0);
            assert!(f.server.mutations().is_empty());
        }
    }

    #[tokio::test]
    async fn test_names_are_matched_exactly() {
        let cases = [
            (
                ImportParams {
                    bucket: Some("Docker Local Test".to_string()),
                    ..import_params()
                },
                ResourceKind::Bucket,
            ),
            (
                ImportParams {
                    flow: Some("test flow ".to_string()),
                    ..import_params()
                },
                ResourceKind::Flow,
            ),
            (
                ImportParams {
                    registry: Some("Docker local".to_string()),
                    ..import_params()
                },
                ResourceKind::RegistryClient,
            ),
            (
                ImportParams {
                    parent: Some("Test Group".to_string()),
                    ..import_params()
                },
                ResourceKind::ParentGroup,
            ),
        ];

        for (params, expected) in cases {
            let f = fixture(populated_server());
            let err = f.reconciler.reconcile("fresh", 1, &params).await.unwrap_err();
            match err {
                DeployError::NotFound { kind, .. } => assert_eq!(kind, expected),
                other => panic!("expected not found, got {:?}", other),
            }
            assert!(f.server.mutations().is_empty());
        }
    }

    #[tokio::test]
    async fn test_registry_must_be_unique_when_unnamed() {
        let server = populated_server();
        server.add_registry_client("second");
        let f = fixture(server);

        let err = f
            .reconciler
            .reconcile("fresh", 1, &import_params())
            .await
            .unwrap_err();
        assert!(err.is_config());
        assert!(f.server.mutations().is_empty());

        let params = ImportParams {
            registry: Some("second".to_string()),
            ..import_params()
        };
        f.reconciler.reconcile("fresh", 1, &params).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_registry_configured() {
        let server = FakeFlowServer::new();
        let bucket = server.add_bucket("docker local test");
        server.add_flow(&bucket, "test flow");
        let f = fixture(server);

        let err = f
            .reconciler
            .reconcile("fresh", 1, &import_params())
            .await
            .unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces() {
        let server = populated_server();
        server.fail_operation("list_buckets");
        let f = fixture(server);

        let err = f
            .reconciler
            .reconcile("fresh", 1, &import_params())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Remote(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upgrade_calls_change_version_exactly_once() {
        let mut flow = MockFlowApi::new();
        let registry = MockRegistryApi::new();
        let root = FakeFlowServer::new();
        let target = root.add_versioned_group(ROOT_ID, "target", "r", "b", "f", 4);
        let root_view = root.get_root_flow().await.unwrap();
        let target_view = root.get_flow(&target).await.unwrap();
        let target_details = root.group(&target).unwrap();

        flow.expect_get_root_flow()
            .times(1)
            .returning(move || Ok(root_view.clone()));
        let views = [
            (ROOT_ID.to_string(), root.get_flow(ROOT_ID).await.unwrap()),
            (target.clone(), target_view),
        ];
        flow.expect_get_flow().returning(move |id| {
            Ok(views
                .iter()
                .find(|(view_id, _)| view_id == id)
                .map(|(_, view)| view.clone())
                .expect("known group"))
        });
        flow.expect_get_group_details()
            .times(1)
            .returning(move |_| Ok(target_details.clone()));
        let expected_target = target.clone();
        flow.expect_create_change_version_request()
            .times(1)
            .withf(move |id, revision, info| {
                id == expected_target && revision.version == 0 && info.version == 5
            })
            .returning(|_, _, _| {
                Ok(flowsync_interfaces::UpdateRequest {
                    request_id: "req-1".to_string(),
                    complete: false,
                    percent_completed: 0,
                    state: None,
                    failure_reason: None,
                })
            });
        flow.expect_get_change_request_status().times(1).returning(|id| {
            Ok(flowsync_interfaces::UpdateRequest {
                request_id: id.to_string(),
                complete: true,
                percent_completed: 100,
                state: None,
                failure_reason: None,
            })
        });

        let reconciler = Reconciler::new(Arc::new(flow), Arc::new(registry));
        let outcome = reconciler
            .reconcile("target", 5, &ImportParams::default())
            .await
            .unwrap();
        assert_eq!(outcome.group_id(), target);
    }
}
