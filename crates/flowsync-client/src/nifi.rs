//! Flow-management API client
//!
//! Implements [`FlowApi`] on top of the server's REST endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use flowsync_interfaces::flow::{
    ProcessGroupFlowEntity, RegistryClientsEntity, UpdateRequestEntity,
};
use flowsync_interfaces::{
    ApiResult, FlowApi, FlowContents, Position, ProcessGroupEntity, ProcessGroupFlow,
    RegistryClientEntity, Revision, UpdateRequest, VersionControlInformation,
};

use crate::config::HttpClientConfig;
use crate::session::Session;
use crate::transport::ApiTransport;

/// Alias the server accepts for the root group id
const ROOT_ALIAS: &str = "root";

/// Request payload for a change-version job
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionChangeBody<'a> {
    process_group_revision: &'a Revision,
    disconnected_node_acknowledged: bool,
    version_control_information: &'a VersionControlInformation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewGroupComponent<'a> {
    position: Position,
    version_control_information: &'a VersionControlInformation,
}

/// Request payload for creating a registry-tracked child group
#[derive(Debug, Serialize)]
struct NewGroupBody<'a> {
    component: NewGroupComponent<'a>,
    revision: Revision,
}

#[derive(Debug, Serialize)]
struct RenameComponent<'a> {
    id: &'a str,
    name: &'a str,
}

/// Request payload for renaming a group
#[derive(Debug, Serialize)]
struct RenameBody<'a> {
    component: RenameComponent<'a>,
    revision: &'a Revision,
}

/// Client for the flow-management REST API
#[derive(Debug, Clone)]
pub struct NifiClient {
    transport: ApiTransport,
    client_id: String,
}

impl NifiClient {
    /// Creates a client; it still needs [`NifiClient::authenticate`] unless
    /// configured for anonymous access
    pub fn new(config: &HttpClientConfig) -> ApiResult<Self> {
        Ok(Self {
            transport: ApiTransport::new("NifiClient", config)?,
            client_id: Uuid::new_v4().to_string(),
        })
    }

    /// Acquires a session token
    #[instrument(skip(self, password))]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> ApiResult<()> {
        self.transport.authenticate(username, password).await
    }

    /// Current session
    pub fn session(&self) -> &Session {
        self.transport.session()
    }

    /// Client id stamped on revisions this client creates
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[async_trait]
impl FlowApi for NifiClient {
    async fn get_root_flow(&self) -> ApiResult<ProcessGroupFlow> {
        self.get_flow(ROOT_ALIAS).await
    }

    #[instrument(skip(self))]
    async fn get_flow(&self, group_id: &str) -> ApiResult<ProcessGroupFlow> {
        debug!("Fetching process group flow");
        let entity: ProcessGroupFlowEntity = self
            .transport
            .get_json(
                "Get Process Group",
                "get_flow",
                &format!("/flow/process-groups/{}", group_id),
            )
            .await?;
        Ok(entity.process_group_flow)
    }

    #[instrument(skip(self))]
    async fn get_group_details(&self, group_id: &str) -> ApiResult<ProcessGroupEntity> {
        debug!("Fetching process group details");
        self.transport
            .get_json(
                "Get Process Group",
                "get_group_details",
                &format!("/process-groups/{}", group_id),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn list_components(&self, group_id: &str) -> ApiResult<FlowContents> {
        let entity: ProcessGroupFlowEntity = self
            .transport
            .get_json(
                "Get Suggested Group Position",
                "list_components",
                &format!("/flow/process-groups/{}", group_id),
            )
            .await?;
        Ok(entity.process_group_flow.flow)
    }

    #[instrument(skip(self, revision, version_info), fields(version = version_info.version))]
    async fn create_change_version_request(
        &self,
        group_id: &str,
        revision: &Revision,
        version_info: &VersionControlInformation,
    ) -> ApiResult<UpdateRequest> {
        let body = VersionChangeBody {
            process_group_revision: revision,
            disconnected_node_acknowledged: false,
            version_control_information: version_info,
        };
        let entity: UpdateRequestEntity = self
            .transport
            .send_json(
                Method::POST,
                "Change Version",
                "create_change_version_request",
                &format!("/versions/update-requests/process-groups/{}", group_id),
                &body,
            )
            .await?;
        debug!(request_id = %entity.request.request_id, "Change version request created");
        Ok(entity.request)
    }

    #[instrument(skip(self))]
    async fn get_change_request_status(&self, request_id: &str) -> ApiResult<UpdateRequest> {
        let entity: UpdateRequestEntity = self
            .transport
            .get_json(
                "Get Update Request Status",
                "get_change_request_status",
                &format!("/versions/update-requests/{}", request_id),
            )
            .await?;
        Ok(entity.request)
    }

    #[instrument(
        skip(self, version_info),
        fields(flow_id = %version_info.flow_id, version = version_info.version)
    )]
    async fn create_child_group(
        &self,
        parent_id: &str,
        version_info: &VersionControlInformation,
        position: Position,
    ) -> ApiResult<ProcessGroupEntity> {
        let body = NewGroupBody {
            component: NewGroupComponent {
                position,
                version_control_information: version_info,
            },
            revision: Revision {
                client_id: Some(self.client_id.clone()),
                ..Revision::initial()
            },
        };
        self.transport
            .send_json(
                Method::POST,
                "Create Process Group",
                "create_child_group",
                &format!("/process-groups/{}/process-groups", parent_id),
                &body,
            )
            .await
    }

    #[instrument(skip(self, revision), fields(revision = revision.version))]
    async fn rename_group(
        &self,
        group_id: &str,
        name: &str,
        revision: &Revision,
    ) -> ApiResult<ProcessGroupEntity> {
        let body = RenameBody {
            component: RenameComponent { id: group_id, name },
            revision,
        };
        self.transport
            .send_json(
                Method::PUT,
                "Change Process Group Name",
                "rename_group",
                &format!("/process-groups/{}", group_id),
                &body,
            )
            .await
    }

    #[instrument(skip(self))]
    async fn list_registry_connections(&self) -> ApiResult<Vec<RegistryClientEntity>> {
        let entity: RegistryClientsEntity = self
            .transport
            .get_json(
                "Get Registry Clients",
                "list_registry_connections",
                "/controller/registry-clients",
            )
            .await?;
        Ok(entity.registries)
    }
}
