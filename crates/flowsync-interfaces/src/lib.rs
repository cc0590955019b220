//! Flowsync Interfaces
//!
//! Wire types and client contracts shared by the HTTP adapters, the
//! reconciliation core and the test utilities.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types for API clients
pub mod error;

/// Flow-management server model and client contract
pub mod flow;

/// Flow registry model and client contract
pub mod registry;

/// Re-export key types for convenient usage
pub use error::{ApiError, ApiResult};
pub use flow::{
    Breadcrumb, ComponentEntity, ComponentPosition, FlowApi, FlowContents, Position,
    ProcessGroupComponent, ProcessGroupEntity, ProcessGroupFlow, RegistryClientComponent,
    RegistryClientEntity, Revision, UpdateRequest, VersionControlInformation,
};
pub use registry::{Bucket, RegistryApi, VersionedFlow};
