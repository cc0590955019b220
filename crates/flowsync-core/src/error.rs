//! Error types for reconciliation

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use flowsync_interfaces::{ApiError, UpdateRequest};

/// Result type for reconciliation operations
pub type DeployResult<T> = Result<T, DeployError>;

/// Named resource looked up during an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Registry bucket
    Bucket,
    /// Flow inside a bucket
    Flow,
    /// Registry connection configured on the flow-management server
    RegistryClient,
    /// Group to import into
    ParentGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Bucket => "bucket",
            ResourceKind::Flow => "flow",
            ResourceKind::RegistryClient => "registry client",
            ResourceKind::ParentGroup => "parent process group",
        };
        f.write_str(label)
    }
}

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum DeployError {
    /// Missing or ambiguous input, raised before any mutating call
    #[error("Configuration error: {0}")]
    Config(String),

    /// A named resource does not exist
    #[error("{kind} {name:?} does not exist")]
    NotFound {
        /// What was looked up
        kind: ResourceKind,
        /// The name that did not match
        name: String,
    },

    /// The group exists but is not bound to a registry flow
    #[error("process group {group_id} is not under version control")]
    NotVersionControlled {
        /// Group id
        group_id: String,
    },

    /// Any failed call to the flow-management or registry API
    #[error(transparent)]
    Remote(#[from] ApiError),

    /// The change-version job did not complete within the bound
    #[error("Change Version: upgrade of {group_id} timed out after {elapsed:?}: {last_status}")]
    Timeout {
        /// Group being upgraded
        group_id: String,
        /// Time spent polling
        elapsed: Duration,
        /// Last observed job status
        last_status: UpdateRequest,
    },
}

impl DeployError {
    /// Whether the error was raised before talking to the server about
    /// the target
    pub fn is_config(&self) -> bool {
        matches!(self, DeployError::Config(_))
    }

    /// Whether a named resource was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeployError::NotFound { .. })
    }

    /// Whether the version change timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployError::Timeout { .. })
    }
}
