//! flowsync
//!
//! Imports a registry-versioned process group into a flow-management server,
//! or upgrades it in place when a group with that name already exists.
//!
//! The binary parses a [`Cli`], validates it into a [`DeployConfig`] and
//! calls [`run`], which builds and authenticates both API clients and hands
//! them to a [`flowsync_core::Reconciler`].

pub mod config;
pub mod error;

use std::sync::Arc;

use tracing::{info, instrument};

use flowsync_client::{NifiClient, RegistryClient};
use flowsync_core::{Outcome, Reconciler};

pub use config::{Cli, Credentials, DeployConfig};
pub use error::{CliError, CliResult};

/// Builds the flow-management client, authenticating unless anonymous
pub async fn connect_nifi(config: &DeployConfig) -> CliResult<NifiClient> {
    let mut client = NifiClient::new(&config.nifi)?;
    if !config.nifi.anonymous {
        let credentials = config.credentials()?;
        client
            .authenticate(&credentials.username, &credentials.password)
            .await?;
    }
    Ok(client)
}

/// Builds the registry client, authenticating unless anonymous
pub async fn connect_registry(config: &DeployConfig) -> CliResult<RegistryClient> {
    let mut client = RegistryClient::new(&config.registry)?;
    if !config.registry.anonymous {
        let credentials = config.credentials()?;
        client
            .authenticate(&credentials.username, &credentials.password)
            .await?;
    }
    Ok(client)
}

/// Runs one resolve-then-act cycle
#[instrument(skip(config), fields(name = %config.name, version = config.version))]
pub async fn run(config: &DeployConfig) -> CliResult<Outcome> {
    let nifi = connect_nifi(config).await?;
    let registry = connect_registry(config).await?;

    let reconciler =
        Reconciler::new(Arc::new(nifi), Arc::new(registry)).with_poll_settings(config.poll);
    let outcome = reconciler
        .reconcile(&config.name, config.version, &config.import)
        .await?;

    match &outcome {
        Outcome::Upgraded { group_id, version } => {
            info!(%group_id, version, "Process group upgraded")
        }
        Outcome::Imported { group } => {
            info!(group_id = %group.id, "Process group imported")
        }
    }
    Ok(outcome)
}
