//! Drives a server-side change-version job to completion

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, instrument, warn};

use flowsync_interfaces::FlowApi;

use crate::error::{DeployError, DeployResult};
use crate::progress::ProgressObserver;

/// Bounds of the status polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Give up once this much time passed since the job was submitted
    pub timeout: Duration,
    /// Pause between two status reads
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(50),
        }
    }
}

impl PollSettings {
    /// Creates poll settings
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Moves the group `group_id` to `version` of the flow it is bound to.
///
/// The job is submitted with the revision of a fresh read, then polled until
/// the server reports it complete or `settings.timeout` elapses. Returns the
/// group id on completion. The observer sees the start, every incomplete
/// percentage, and exactly one terminal event.
#[instrument(skip(api, settings, observer))]
pub async fn change_version(
    api: &dyn FlowApi,
    group_id: &str,
    version: i64,
    settings: &PollSettings,
    observer: &dyn ProgressObserver,
) -> DeployResult<String> {
    match drive(api, group_id, version, settings, observer).await {
        Ok(()) => {
            observer.completed(group_id);
            Ok(group_id.to_string())
        }
        Err(err) => {
            observer.failed(group_id, &err.to_string());
            Err(err)
        }
    }
}

async fn drive(
    api: &dyn FlowApi,
    group_id: &str,
    version: i64,
    settings: &PollSettings,
    observer: &dyn ProgressObserver,
) -> DeployResult<()> {
    let details = api.get_group_details(group_id).await?;
    let binding = details
        .component
        .version_control_information
        .as_ref()
        .ok_or_else(|| DeployError::NotVersionControlled {
            group_id: group_id.to_string(),
        })?;

    info!(
        group_id,
        current_version = binding.version,
        desired_version = version,
        "Upgrading process group"
    );

    let target = binding.with_version(version);
    let request = api
        .create_change_version_request(group_id, &details.revision, &target)
        .await?;

    let started = Instant::now();
    observer.started(group_id);
    let mut status = api.get_change_request_status(&request.request_id).await?;

    // No fresh read once the bound is exceeded: the last status decides.
    while !status.complete {
        observer.progress(status.percent_completed);
        if started.elapsed() > settings.timeout {
            break;
        }
        sleep(settings.interval).await;
        status = api.get_change_request_status(&request.request_id).await?;
    }

    if !status.complete {
        return Err(DeployError::Timeout {
            group_id: group_id.to_string(),
            elapsed: started.elapsed(),
            last_status: status,
        });
    }

    if let Some(reason) = &status.failure_reason {
        warn!(
            group_id,
            request_id = %status.request_id,
            "Change version finished with: {}",
            reason
        );
    }
    Ok(())
}
