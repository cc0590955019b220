//! HTTP adapters for the flow-management server and the flow registry.
//!
//! Both clients share a [`transport::ApiTransport`] that owns the HTTP
//! connection pool and the session. Unless a client is configured for
//! anonymous access, every call requires a token obtained through
//! `authenticate` first.

pub mod config;
pub mod nifi;
pub mod registry;
pub mod session;
pub mod transport;

pub use config::HttpClientConfig;
pub use nifi::NifiClient;
pub use registry::RegistryClient;
pub use session::Session;
