//! In-memory flow-management server with an attached registry.
//!
//! Models the process-group tree, revisions, registry connections, buckets
//! and flows, and change-version jobs whose status sequence is scripted by
//! the test. Every mutation is recorded and checked against the group's
//! current revision the way the real server does.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use flowsync_interfaces::flow::{BreadcrumbEntity, RegistryClientComponent};
use flowsync_interfaces::{
    ApiError, ApiResult, Breadcrumb, Bucket, ComponentEntity, ComponentPosition, FlowApi,
    FlowContents, Position, ProcessGroupComponent, ProcessGroupEntity, ProcessGroupFlow,
    RegistryApi, RegistryClientEntity, Revision, UpdateRequest, VersionControlInformation,
    VersionedFlow,
};

/// Id of the root group
pub const ROOT_ID: &str = "root-id";

/// Display name of the root group
pub const ROOT_NAME: &str = "NiFi Flow";

/// A mutating call accepted by the fake server
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Change-version job submitted
    ChangeVersion {
        /// Target group
        group_id: String,
        /// Revision sent with the request
        revision: i64,
        /// Requested version
        version: i64,
    },
    /// Child group created
    CreateGroup {
        /// Parent group
        parent_id: String,
        /// Assigned id
        group_id: String,
        /// Registry binding of the new group
        version_info: VersionControlInformation,
        /// Requested position
        position: Position,
    },
    /// Group renamed
    Rename {
        /// Target group
        group_id: String,
        /// New name
        name: String,
        /// Revision sent with the request
        revision: i64,
    },
}

#[derive(Debug, Clone)]
struct FakeGroup {
    id: String,
    name: String,
    parent: Option<String>,
    children: Vec<String>,
    binding: Option<VersionControlInformation>,
    revision: i64,
    position: ComponentPosition,
    components: Vec<ComponentEntity>,
}

impl FakeGroup {
    fn new(id: String, name: String, parent: Option<String>) -> Self {
        Self {
            id,
            name,
            parent,
            children: Vec::new(),
            binding: None,
            revision: 0,
            position: ComponentPosition::default(),
            components: Vec::new(),
        }
    }

    fn entity(&self) -> ProcessGroupEntity {
        ProcessGroupEntity {
            id: self.id.clone(),
            revision: Revision {
                version: self.revision,
                client_id: None,
                last_modifier: None,
            },
            component: ProcessGroupComponent {
                id: self.id.clone(),
                name: self.name.clone(),
                parent_group_id: self.parent.clone(),
                version_control_information: self.binding.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct FakeRequest {
    group_id: String,
    target: VersionControlInformation,
    applied: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: usize,
    groups: HashMap<String, FakeGroup>,
    registry_clients: Vec<RegistryClientEntity>,
    buckets: Vec<Bucket>,
    flows: HashMap<String, Vec<VersionedFlow>>,
    statuses: VecDeque<(bool, u8)>,
    requests: HashMap<String, FakeRequest>,
    visited: Vec<String>,
    mutations: Vec<Mutation>,
    calls: Vec<String>,
    failing: HashSet<String>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn record(&mut self, method: &str) -> ApiResult<()> {
        self.calls.push(method.to_string());
        if self.failing.contains(method) {
            return Err(ApiError::Http {
                operation: method.to_string(),
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn group(&self, method: &str, id: &str) -> ApiResult<&FakeGroup> {
        let id = if id == "root" { ROOT_ID } else { id };
        self.groups.get(id).ok_or_else(|| not_found(method, id))
    }

    fn group_mut(&mut self, method: &str, id: &str) -> ApiResult<&mut FakeGroup> {
        self.groups.get_mut(id).ok_or_else(|| not_found(method, id))
    }

    fn flow_view(&self, group: &FakeGroup) -> ProcessGroupFlow {
        let process_groups = group
            .children
            .iter()
            .filter_map(|id| self.groups.get(id))
            .map(|child| ComponentEntity {
                id: child.id.clone(),
                position: Some(child.position),
            })
            .collect();

        ProcessGroupFlow {
            id: group.id.clone(),
            parent_group_id: group.parent.clone(),
            breadcrumb: BreadcrumbEntity {
                id: group.id.clone(),
                breadcrumb: Breadcrumb {
                    id: group.id.clone(),
                    name: group.name.clone(),
                },
            },
            flow: FlowContents {
                process_groups,
                processors: group.components.clone(),
                ..FlowContents::default()
            },
        }
    }

    fn check_revision(method: &str, group: &FakeGroup, revision: &Revision) -> ApiResult<()> {
        if group.revision != revision.version {
            return Err(ApiError::Http {
                operation: method.to_string(),
                status: 409,
                body: format!(
                    "Error: [{}] is not the most up-to-date revision. This component appears to have been modified",
                    revision.version
                ),
            });
        }
        Ok(())
    }
}

fn not_found(method: &str, id: &str) -> ApiError {
    ApiError::Http {
        operation: method.to_string(),
        status: 404,
        body: format!("Unable to find component with id '{}'.", id),
    }
}

/// In-memory flow-management server and registry
pub struct FakeFlowServer {
    state: Mutex<State>,
}

impl fmt::Debug for FakeFlowServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FakeFlowServer")
            .field("group_count", &state.groups.len())
            .field("mutation_count", &state.mutations.len())
            .finish()
    }
}

impl Default for FakeFlowServer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFlowServer {
    /// Creates a server holding only the root group
    pub fn new() -> Self {
        let mut state = State::default();
        state.groups.insert(
            ROOT_ID.to_string(),
            FakeGroup::new(ROOT_ID.to_string(), ROOT_NAME.to_string(), None),
        );
        Self {
            state: Mutex::new(state),
        }
    }

    /// Adds an unversioned group under `parent_id` and returns its id
    pub fn add_group(&self, parent_id: &str, name: &str) -> String {
        let mut state = self.state.lock();
        let id = state.next_id("pg");
        let group = FakeGroup::new(id.clone(), name.to_string(), Some(parent_id.to_string()));
        state
            .groups
            .get_mut(parent_id)
            .unwrap_or_else(|| panic!("unknown parent group {}", parent_id))
            .children
            .push(id.clone());
        state.groups.insert(id.clone(), group);
        id
    }

    /// Adds a group bound to a registry flow at `version`
    pub fn add_versioned_group(
        &self,
        parent_id: &str,
        name: &str,
        registry_id: &str,
        bucket_id: &str,
        flow_id: &str,
        version: i64,
    ) -> String {
        let id = self.add_group(parent_id, name);
        let mut binding = VersionControlInformation::new(registry_id, bucket_id, flow_id, version);
        binding
            .extra
            .insert("state".to_string(), Value::String("UP_TO_DATE".to_string()));
        if let Some(group) = self.state.lock().groups.get_mut(&id) {
            group.binding = Some(binding);
        }
        id
    }

    /// Moves a group on its parent's canvas
    pub fn place_group(&self, group_id: &str, x: f64, y: f64) {
        let mut state = self.state.lock();
        if let Some(group) = state.groups.get_mut(group_id) {
            group.position = ComponentPosition { x, y };
        }
    }

    /// Adds a processor at `(x, y)` inside `group_id`
    pub fn add_component(&self, group_id: &str, x: f64, y: f64) {
        let mut state = self.state.lock();
        let id = state.next_id("proc");
        if let Some(group) = state.groups.get_mut(group_id) {
            group.components.push(ComponentEntity {
                id,
                position: Some(ComponentPosition { x, y }),
            });
        }
    }

    /// Configures a registry connection and returns its id
    pub fn add_registry_client(&self, name: &str) -> String {
        let mut state = self.state.lock();
        let id = state.next_id("reg");
        state.registry_clients.push(RegistryClientEntity {
            id: id.clone(),
            component: RegistryClientComponent {
                name: name.to_string(),
            },
        });
        id
    }

    /// Creates a registry bucket and returns its id
    pub fn add_bucket(&self, name: &str) -> String {
        let mut state = self.state.lock();
        let id = state.next_id("bucket");
        state.buckets.push(Bucket {
            identifier: id.clone(),
            name: name.to_string(),
        });
        state.flows.insert(id.clone(), Vec::new());
        id
    }

    /// Stores a flow in `bucket_id` and returns its id
    pub fn add_flow(&self, bucket_id: &str, name: &str) -> String {
        let mut state = self.state.lock();
        let id = state.next_id("flow");
        state
            .flows
            .entry(bucket_id.to_string())
            .or_default()
            .push(VersionedFlow {
                identifier: id.clone(),
                name: name.to_string(),
                bucket_identifier: Some(bucket_id.to_string()),
                version_count: None,
            });
        id
    }

    /// Scripts the `(complete, percent)` answers of status reads; the last
    /// entry repeats forever. Without a script jobs complete immediately.
    pub fn script_statuses(&self, statuses: Vec<(bool, u8)>) {
        self.state.lock().statuses = statuses.into();
    }

    /// Makes every call of the named trait method fail with status 500
    pub fn fail_operation(&self, method: &str) {
        self.state.lock().failing.insert(method.to_string());
    }

    /// Simulates a concurrent edit of the group
    pub fn bump_revision(&self, group_id: &str) {
        if let Some(group) = self.state.lock().groups.get_mut(group_id) {
            group.revision += 1;
        }
    }

    /// Group ids fetched through `get_flow`, in call order
    pub fn visited(&self) -> Vec<String> {
        self.state.lock().visited.clone()
    }

    /// Accepted mutations, in call order
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().mutations.clone()
    }

    /// Number of calls of the named trait method
    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.as_str() == method)
            .count()
    }

    /// Current snapshot of a group
    pub fn group(&self, group_id: &str) -> Option<ProcessGroupEntity> {
        self.state.lock().groups.get(group_id).map(FakeGroup::entity)
    }

    /// Ids of every group with the given name
    pub fn groups_named(&self, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut ids: Vec<String> = state
            .groups
            .values()
            .filter(|group| group.name == name)
            .map(|group| group.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Total number of groups, root included
    pub fn group_count(&self) -> usize {
        self.state.lock().groups.len()
    }
}

#[async_trait]
impl FlowApi for FakeFlowServer {
    async fn get_root_flow(&self) -> ApiResult<ProcessGroupFlow> {
        let mut state = self.state.lock();
        state.record("get_root_flow")?;
        let root = state.group("get_root_flow", ROOT_ID)?;
        Ok(state.flow_view(root))
    }

    async fn get_flow(&self, group_id: &str) -> ApiResult<ProcessGroupFlow> {
        let mut state = self.state.lock();
        state.record("get_flow")?;
        state.visited.push(group_id.to_string());
        let group = state.group("get_flow", group_id)?;
        Ok(state.flow_view(group))
    }

    async fn get_group_details(&self, group_id: &str) -> ApiResult<ProcessGroupEntity> {
        let mut state = self.state.lock();
        state.record("get_group_details")?;
        Ok(state.group("get_group_details", group_id)?.entity())
    }

    async fn list_components(&self, group_id: &str) -> ApiResult<FlowContents> {
        let mut state = self.state.lock();
        state.record("list_components")?;
        let group = state.group("list_components", group_id)?;
        Ok(state.flow_view(group).flow)
    }

    async fn create_change_version_request(
        &self,
        group_id: &str,
        revision: &Revision,
        version_info: &VersionControlInformation,
    ) -> ApiResult<UpdateRequest> {
        let method = "create_change_version_request";
        let mut state = self.state.lock();
        state.record(method)?;
        State::check_revision(method, state.group(method, group_id)?, revision)?;

        let request_id = state.next_id("req");
        state.requests.insert(
            request_id.clone(),
            FakeRequest {
                group_id: group_id.to_string(),
                target: version_info.clone(),
                applied: false,
            },
        );
        state.mutations.push(Mutation::ChangeVersion {
            group_id: group_id.to_string(),
            revision: revision.version,
            version: version_info.version,
        });

        Ok(UpdateRequest {
            request_id,
            complete: false,
            percent_completed: 0,
            state: Some("Initializing".to_string()),
            failure_reason: None,
        })
    }

    async fn get_change_request_status(&self, request_id: &str) -> ApiResult<UpdateRequest> {
        let method = "get_change_request_status";
        let mut state = self.state.lock();
        state.record(method)?;
        if !state.requests.contains_key(request_id) {
            return Err(not_found(method, request_id));
        }

        let (complete, percent) = if state.statuses.len() > 1 {
            state.statuses.pop_front().unwrap_or((true, 100))
        } else {
            state.statuses.front().copied().unwrap_or((true, 100))
        };

        let pending = state
            .requests
            .get_mut(request_id)
            .filter(|request| complete && !request.applied)
            .map(|request| {
                request.applied = true;
                (request.group_id.clone(), request.target.clone())
            });
        if let Some((group_id, target)) = pending {
            let group = state.group_mut(method, &group_id)?;
            group.binding = Some(target);
            group.revision += 1;
        }

        Ok(UpdateRequest {
            request_id: request_id.to_string(),
            complete,
            percent_completed: percent,
            state: Some(if complete { "Complete" } else { "Updating flow" }.to_string()),
            failure_reason: None,
        })
    }

    async fn create_child_group(
        &self,
        parent_id: &str,
        version_info: &VersionControlInformation,
        position: Position,
    ) -> ApiResult<ProcessGroupEntity> {
        let method = "create_child_group";
        let mut state = self.state.lock();
        state.record(method)?;
        state.group(method, parent_id)?;

        let name = state
            .flows
            .values()
            .flatten()
            .find(|flow| flow.identifier == version_info.flow_id)
            .map(|flow| flow.name.clone())
            .unwrap_or_else(|| version_info.flow_id.clone());

        let id = state.next_id("pg");
        let mut group = FakeGroup::new(id.clone(), name, Some(parent_id.to_string()));
        group.binding = Some(version_info.clone());
        group.revision = 1;
        group.position = ComponentPosition {
            x: position.x as f64,
            y: position.y as f64,
        };
        let entity = group.entity();

        state.group_mut(method, parent_id)?.children.push(id.clone());
        state.groups.insert(id.clone(), group);
        state.mutations.push(Mutation::CreateGroup {
            parent_id: parent_id.to_string(),
            group_id: id,
            version_info: version_info.clone(),
            position,
        });
        Ok(entity)
    }

    async fn rename_group(
        &self,
        group_id: &str,
        name: &str,
        revision: &Revision,
    ) -> ApiResult<ProcessGroupEntity> {
        let method = "rename_group";
        let mut state = self.state.lock();
        state.record(method)?;
        State::check_revision(method, state.group(method, group_id)?, revision)?;

        let group = state.group_mut(method, group_id)?;
        group.name = name.to_string();
        group.revision += 1;
        let entity = group.entity();

        state.mutations.push(Mutation::Rename {
            group_id: group_id.to_string(),
            name: name.to_string(),
            revision: revision.version,
        });
        Ok(entity)
    }

    async fn list_registry_connections(&self) -> ApiResult<Vec<RegistryClientEntity>> {
        let mut state = self.state.lock();
        state.record("list_registry_connections")?;
        Ok(state.registry_clients.clone())
    }
}

#[async_trait]
impl RegistryApi for FakeFlowServer {
    async fn list_buckets(&self) -> ApiResult<Vec<Bucket>> {
        let mut state = self.state.lock();
        state.record("list_buckets")?;
        Ok(state.buckets.clone())
    }

    async fn list_flows(&self, bucket_id: &str) -> ApiResult<Vec<VersionedFlow>> {
        let mut state = self.state.lock();
        state.record("list_flows")?;
        state
            .flows
            .get(bucket_id)
            .cloned()
            .ok_or_else(|| not_found("list_flows", bucket_id))
    }
}
