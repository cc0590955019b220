//! Flowsync core
//!
//! Reconciles a named process group on a flow-management server against a
//! registry flow version: the group is upgraded in place when it exists and
//! imported from the registry when it does not.
//!
//! The pipeline is linear: [`resolver`] finds the group by name,
//! [`reconcile`] decides between [`version_change`] and [`import`] (with
//! [`layout`] placing new groups), and a [`progress::ProgressObserver`]
//! receives updates while a version change is running.

pub mod error;
pub mod import;
pub mod layout;
pub mod progress;
pub mod reconcile;
pub mod resolver;
pub mod version_change;

pub use error::{DeployError, DeployResult, ResourceKind};
pub use import::{import_group, ImportRequest};
pub use layout::{position_beside, suggest_position};
pub use progress::{ProgressEvent, ProgressObserver, RecordingObserver, TracingProgress};
pub use reconcile::{ImportParams, Outcome, Reconciler};
pub use resolver::{find_by_name, traverse};
pub use version_change::{change_version, PollSettings};
