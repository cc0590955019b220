//! Progress reporting for long-running version changes

use parking_lot::Mutex;
use tracing::{error, info};

/// Receives updates while a change-version job runs
pub trait ProgressObserver: Send + Sync {
    /// The job was submitted
    fn started(&self, _group_id: &str) {}

    /// Latest reported completion, 0 to 100
    fn progress(&self, percent: u8);

    /// The job finished
    fn completed(&self, _group_id: &str) {}

    /// The job failed or polling gave up
    fn failed(&self, _group_id: &str, _reason: &str) {}
}

/// Observer that writes progress to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn started(&self, group_id: &str) {
        info!(group_id, "Upgrade Progress: Starting");
    }

    fn progress(&self, percent: u8) {
        info!(percent, "Upgrade Progress: {}%", percent);
    }

    fn completed(&self, group_id: &str) {
        info!(group_id, "Upgrade Progress: Done");
    }

    fn failed(&self, group_id: &str, reason: &str) {
        error!(group_id, "Upgrade Progress: Failed: {}", reason);
    }
}

/// Event captured by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Job submitted for the group
    Started(String),
    /// Percent complete
    Progress(u8),
    /// Job finished for the group
    Completed(String),
    /// Job failed with the reason
    Failed(String),
}

/// Observer that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Only the percentages, in order
    pub fn percentages(&self) -> Vec<u8> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Progress(pct) => Some(*pct),
                _ => None,
            })
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn started(&self, group_id: &str) {
        self.events
            .lock()
            .push(ProgressEvent::Started(group_id.to_string()));
    }

    fn progress(&self, percent: u8) {
        self.events.lock().push(ProgressEvent::Progress(percent));
    }

    fn completed(&self, group_id: &str) {
        self.events
            .lock()
            .push(ProgressEvent::Completed(group_id.to_string()));
    }

    fn failed(&self, _group_id: &str, reason: &str) {
        self.events
            .lock()
            .push(ProgressEvent::Failed(reason.to_string()));
    }
}
