//! Creation of a process group from a registry flow

use tracing::{info, instrument};

use flowsync_interfaces::{FlowApi, Position, ProcessGroupEntity, VersionControlInformation};

use crate::error::DeployResult;

/// Fully resolved identifiers of an import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    /// Display name given to the new group
    pub name: String,
    /// Group to create the new group in
    pub parent_id: String,
    /// Registry connection on the flow-management server
    pub registry_id: String,
    /// Registry bucket
    pub bucket_id: String,
    /// Registry flow
    pub flow_id: String,
    /// Flow version to import
    pub version: i64,
    /// Canvas position inside the parent
    pub position: Position,
}

impl ImportRequest {
    fn version_info(&self) -> VersionControlInformation {
        VersionControlInformation::new(
            &self.registry_id,
            &self.bucket_id,
            &self.flow_id,
            self.version,
        )
    }
}

/// Creates the group and then names it.
///
/// The rename uses the revision returned by the create call. When the rename
/// fails the created group stays on the server under its default name.
#[instrument(skip(api, request), fields(name = %request.name, parent_id = %request.parent_id))]
pub async fn import_group(
    api: &dyn FlowApi,
    request: &ImportRequest,
) -> DeployResult<ProcessGroupEntity> {
    info!(
        version = request.version,
        bucket_id = %request.bucket_id,
        flow_id = %request.flow_id,
        registry_id = %request.registry_id,
        position = %request.position,
        "Importing process group"
    );

    let created = api
        .create_child_group(&request.parent_id, &request.version_info(), request.position)
        .await?;
    info!(group_id = %created.id, "Import Progress: Done");

    let renamed = api
        .rename_group(&created.id, &request.name, &created.revision)
        .await?;
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use flowsync_interfaces::{ProcessGroupComponent, Revision};
    use flowsync_test_utils::{FakeFlowServer, MockFlowApi, Mutation, ROOT_ID};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn request(parent_id: &str) -> ImportRequest {
        ImportRequest {
            name: "nested 123456".to_string(),
            parent_id: parent_id.to_string(),
            registry_id: "reg-1".to_string(),
            bucket_id: "bucket-1".to_string(),
            flow_id: "flow-1".to_string(),
            version: 2,
            position: Position::new(530, 2),
        }
    }

    fn entity(id: &str, name: &str, revision: i64) -> ProcessGroupEntity {
        ProcessGroupEntity {
            id: id.to_string(),
            revision: Revision {
                version: revision,
                client_id: None,
                last_modifier: None,
            },
            component: ProcessGroupComponent {
                id: id.to_string(),
                name: name.to_string(),
                parent_group_id: Some(ROOT_ID.to_string()),
                version_control_information: None,
            },
        }
    }

    #[tokio::test]
    async fn test_rename_uses_revision_from_create() {
        let mut api = MockFlowApi::new();
        let mut seq = Sequence::new();
        api.expect_create_child_group()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|parent, info, position| {
                parent == ROOT_ID
                    && info.registry_id == "reg-1"
                    && info.bucket_id == "bucket-1"
                    && info.flow_id == "flow-1"
                    && info.version == 2
                    && *position == Position::new(530, 2)
            })
            .returning(|_, _, _| Ok(entity("pg-new", "test flow", 7)));
        api.expect_rename_group()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|id, name, revision| {
                id == "pg-new" && name == "nested 123456" && revision.version == 7
            })
            .returning(|id, name, _| Ok(entity(id, name, 8)));

        let group = import_group(&api, &request(ROOT_ID)).await.unwrap();
        assert_eq!(group.id, "pg-new");
        assert_eq!(group.name(), "nested 123456");
        assert_eq!(group.revision.version, 8);
    }

    #[tokio::test]
    async fn test_import_into_fake_server() {
        let server = FakeFlowServer::new();
        let parent = server.add_group(ROOT_ID, "test group");

        let group = import_group(&server, &request(&parent)).await.unwrap();

        let mutations = server.mutations();
        assert_eq!(mutations.len(), 2);
        assert!(matches!(
            &mutations[0],
            Mutation::CreateGroup { parent_id, position, .. }
                if parent_id == &parent && *position == Position::new(530, 2)
        ));
        assert_eq!(
            mutations[1],
            Mutation::Rename {
                group_id: group.id.clone(),
                name: "nested 123456".to_string(),
                revision: 1,
            }
        );
        assert_eq!(server.groups_named("nested 123456"), vec![group.id.clone()]);
        assert_eq!(group.current_version(), Some(2));
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_created_group() {
        let server = FakeFlowServer::new();
        server.fail_operation("rename_group");

        let err = import_group(&server, &request(ROOT_ID)).await.unwrap_err();

        assert!(matches!(err, DeployError::Remote(_)));
        assert_eq!(server.group_count(), 2);
        assert!(server.groups_named("nested 123456").is_empty());
    }
}
