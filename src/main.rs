use anyhow::{Context, Result};
use clap::Parser;

use flowsync::{Cli, DeployConfig};
use flowsync_monitoring::LogExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    flowsync_monitoring::init_logging(&cli.monitoring_config())
        .context("Failed to initialize logging")?;

    let config = DeployConfig::from_cli(cli).context("Invalid configuration")?;

    let outcome = flowsync::run(&config)
        .await
        .log_err("Deployment failed")
        .context("Deployment failed")?;

    println!("{}", outcome.group_id());
    Ok(())
}
