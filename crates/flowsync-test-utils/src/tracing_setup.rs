//! Tracing for tests

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test tracing
/// This function sets up tracing for tests with a consistent format
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("flowsync=debug,flowsync_core=debug,flowsync_client=debug")
    });
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
