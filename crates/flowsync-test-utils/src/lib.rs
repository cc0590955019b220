//! Testing utilities for Flowsync.
//!
//! Provides `mockall` mocks of the API contracts, an in-memory
//! [`FakeFlowServer`] that behaves like a small flow-management server with
//! an attached registry, and tracing setup for tests.

pub mod fake_server;
pub mod mocks;
pub mod tracing_setup;

/// Re-export commonly used types for convenience
pub use mockall;

pub use fake_server::{FakeFlowServer, Mutation, ROOT_ID};
pub use mocks::{MockFlowApi, MockRegistryApi};
pub use tracing_setup::init_test_tracing;
