//! Flow-management server interfaces
//!
//! Entities returned by the flow-management REST API and the contract the
//! reconciliation core consumes. Field names follow the server's camelCase
//! JSON; unknown fields are ignored on read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiResult;

/// Optimistic-concurrency stamp attached to every mutable entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// Monotonic revision number
    pub version: i64,

    /// Client id that performed the last mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// User that performed the last mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modifier: Option<String>,
}

impl Revision {
    /// Revision used when creating a brand new entity
    pub fn initial() -> Self {
        Self::default()
    }
}

/// Binding of a process group to a versioned flow in a registry
///
/// Fields other than the four coordinates are kept verbatim so a change
/// request can send the binding back with only the version replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionControlInformation {
    /// Registry client id on the flow-management server
    pub registry_id: String,

    /// Registry bucket id
    pub bucket_id: String,

    /// Registry flow id
    pub flow_id: String,

    /// Flow version
    pub version: i64,

    /// Remaining server-reported fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionControlInformation {
    /// Creates a binding with only the coordinates set
    pub fn new(
        registry_id: impl Into<String>,
        bucket_id: impl Into<String>,
        flow_id: impl Into<String>,
        version: i64,
    ) -> Self {
        Self {
            registry_id: registry_id.into(),
            bucket_id: bucket_id.into(),
            flow_id: flow_id.into(),
            version,
            extra: Map::new(),
        }
    }

    /// Same binding pointing at another version
    pub fn with_version(&self, version: i64) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }
}

/// Component part of a process group entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupComponent {
    /// Group id
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Id of the enclosing group, absent for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,

    /// Current version-control binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_control_information: Option<VersionControlInformation>,
}

/// Full details of a process group, including its revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupEntity {
    /// Group id
    pub id: String,

    /// Revision to use on the next mutation of this group
    pub revision: Revision,

    /// Group component
    pub component: ProcessGroupComponent,
}

impl ProcessGroupEntity {
    /// Display name of the group
    pub fn name(&self) -> &str {
        &self.component.name
    }

    /// Currently bound flow version, if the group is under version control
    pub fn current_version(&self) -> Option<i64> {
        self.component
            .version_control_information
            .as_ref()
            .map(|vci| vci.version)
    }
}

/// Position as reported by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPosition {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

/// Layout position for a new process group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: i64,
    /// Vertical coordinate
    pub y: i64,
}

impl Position {
    /// Creates a position
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The canvas origin
    pub fn origin() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Any component placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEntity {
    /// Component id
    pub id: String,

    /// Canvas position; some components (e.g. connections) may omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ComponentPosition>,
}

/// Contents of a process group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowContents {
    /// Child process groups
    pub process_groups: Vec<ComponentEntity>,
    /// Remote process group references
    pub remote_process_groups: Vec<ComponentEntity>,
    /// Processors
    pub processors: Vec<ComponentEntity>,
    /// Input ports
    pub input_ports: Vec<ComponentEntity>,
    /// Output ports
    pub output_ports: Vec<ComponentEntity>,
    /// Connections
    pub connections: Vec<ComponentEntity>,
    /// Labels
    pub labels: Vec<ComponentEntity>,
    /// Funnels
    pub funnels: Vec<ComponentEntity>,
}

impl FlowContents {
    /// Every component of the group, in a fixed category order
    pub fn components(&self) -> impl Iterator<Item = &ComponentEntity> {
        self.process_groups
            .iter()
            .chain(&self.remote_process_groups)
            .chain(&self.processors)
            .chain(&self.input_ports)
            .chain(&self.output_ports)
            .chain(&self.connections)
            .chain(&self.labels)
            .chain(&self.funnels)
    }

    /// Positions of all components that report one
    pub fn positions(&self) -> impl Iterator<Item = ComponentPosition> + '_ {
        self.components().filter_map(|c| c.position)
    }
}

/// Id and name of a group as shown in the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Group id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Breadcrumb wrapper as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadcrumbEntity {
    /// Group id
    #[serde(default)]
    pub id: String,
    /// Breadcrumb of the group itself
    pub breadcrumb: Breadcrumb,
}

/// Navigation view of a process group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupFlow {
    /// Group id
    pub id: String,

    /// Id of the enclosing group, absent for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,

    /// Breadcrumb carrying the display name
    pub breadcrumb: BreadcrumbEntity,

    /// Components inside the group
    #[serde(default)]
    pub flow: FlowContents,
}

impl ProcessGroupFlow {
    /// Display name of the group
    pub fn name(&self) -> &str {
        &self.breadcrumb.breadcrumb.name
    }

    /// Ids of the direct child groups in server-reported order
    pub fn child_group_ids(&self) -> impl Iterator<Item = &str> {
        self.flow.process_groups.iter().map(|pg| pg.id.as_str())
    }
}

/// Envelope of `GET /flow/process-groups/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupFlowEntity {
    /// The group flow
    pub process_group_flow: ProcessGroupFlow,
}

/// Server-side asynchronous version change job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Request id used for polling
    pub request_id: String,

    /// Whether the job finished
    #[serde(default)]
    pub complete: bool,

    /// Progress in percent, 0 to 100
    #[serde(default)]
    pub percent_completed: u8,

    /// Human-readable job state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Reason reported when the job failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl std::fmt::Display for UpdateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "request {} complete={} percent={}",
            self.request_id, self.complete, self.percent_completed
        )?;
        if let Some(state) = &self.state {
            write!(f, " state={:?}", state)?;
        }
        if let Some(reason) = &self.failure_reason {
            write!(f, " failure={:?}", reason)?;
        }
        Ok(())
    }
}

/// Envelope of the update-request endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequestEntity {
    /// The request
    pub request: UpdateRequest,
}

/// Name of a configured registry client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryClientComponent {
    /// Display name
    pub name: String,
}

/// A registry connection configured on the flow-management server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryClientEntity {
    /// Registry client id
    pub id: String,
    /// Registry client component
    pub component: RegistryClientComponent,
}

impl RegistryClientEntity {
    /// Display name of the connection
    pub fn name(&self) -> &str {
        &self.component.name
    }
}

/// Envelope of `GET /controller/registry-clients`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryClientsEntity {
    /// Configured connections
    #[serde(default)]
    pub registries: Vec<RegistryClientEntity>,
}

/// Contract for the flow-management API client
#[async_trait]
pub trait FlowApi: Send + Sync {
    /// Contract: Fetches the navigation view of the root process group.
    async fn get_root_flow(&self) -> ApiResult<ProcessGroupFlow>;

    /// Contract: Fetches the navigation view of the group `group_id`.
    /// Child groups are listed but not expanded.
    async fn get_flow(&self, group_id: &str) -> ApiResult<ProcessGroupFlow>;

    /// Contract: Fetches the group entity with its current revision and
    /// version-control binding.
    async fn get_group_details(&self, group_id: &str) -> ApiResult<ProcessGroupEntity>;

    /// Contract: Lists every canvas component directly under `group_id`.
    async fn list_components(&self, group_id: &str) -> ApiResult<FlowContents>;

    /// Contract: Submits a change-version job for `group_id`.
    /// - `revision` must come from the latest read of the group.
    /// - Returns the pending request descriptor.
    async fn create_change_version_request(
        &self,
        group_id: &str,
        revision: &Revision,
        version_info: &VersionControlInformation,
    ) -> ApiResult<UpdateRequest>;

    /// Contract: Reads the status of a change-version job.
    async fn get_change_request_status(&self, request_id: &str) -> ApiResult<UpdateRequest>;

    /// Contract: Creates a child group of `parent_id` bound to the given
    /// registry flow version and placed at `position`. The server assigns id
    /// and initial revision.
    async fn create_child_group(
        &self,
        parent_id: &str,
        version_info: &VersionControlInformation,
        position: Position,
    ) -> ApiResult<ProcessGroupEntity>;

    /// Contract: Renames `group_id`. `revision` must come from the latest
    /// read or mutation of the group.
    async fn rename_group(
        &self,
        group_id: &str,
        name: &str,
        revision: &Revision,
    ) -> ApiResult<ProcessGroupEntity>;

    /// Contract: Lists the registry connections configured on the server.
    async fn list_registry_connections(&self) -> ApiResult<Vec<RegistryClientEntity>>;
}
