//! Connection settings shared by both API clients

use std::time::Duration;

/// Configuration for an API client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL of the API, e.g. `https://nifi:8443/nifi-api`
    pub base_url: String,
    /// Verify the server's TLS certificate
    pub verify_tls: bool,
    /// Allow calls without a session token
    pub anonymous: bool,
    /// Timeout in seconds for HTTP requests
    pub timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/nifi-api".to_string(),
            verify_tls: true,
            anonymous: false,
            timeout_secs: 30,
        }
    }
}

impl HttpClientConfig {
    /// Configuration for `base_url` with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Toggles anonymous access
    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }

    /// Toggles TLS certificate verification
    pub fn verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without trailing slashes
    pub(crate) fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
