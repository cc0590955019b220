//! Logging setup for flowsync.

pub mod logging;

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter (e.g., "info,flowsync_client=debug"), used when
    /// `RUST_LOG` is not set
    pub log_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "flowsync".to_string(),
            log_filter: "info".to_string(),
            json: false,
        }
    }
}

impl MonitoringConfig {
    /// Config with the given filter and format
    pub fn new(log_filter: impl Into<String>, json: bool) -> Self {
        Self {
            log_filter: log_filter.into(),
            json,
            ..Self::default()
        }
    }
}

pub use logging::{init_logging, LogExt};
