//! Error types for the command line entry point

use thiserror::Error;

use flowsync_core::DeployError;
use flowsync_interfaces::ApiError;

/// Result type for the entry point
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by [`crate::run`]
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line or environment settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client construction or authentication failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Reconciliation failed
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl CliError {
    /// Whether the error was raised before contacting any server
    pub fn is_config(&self) -> bool {
        match self {
            CliError::Config(_) => true,
            CliError::Deploy(err) => err.is_config(),
            CliError::Api(ApiError::InvalidConfig(_)) => true,
            CliError::Api(_) => false,
        }
    }
}
