//! Flow registry API client

use async_trait::async_trait;
use tracing::{debug, instrument};

use flowsync_interfaces::{ApiResult, Bucket, RegistryApi, VersionedFlow};

use crate::config::HttpClientConfig;
use crate::session::Session;
use crate::transport::ApiTransport;

/// Client for the flow registry REST API
#[derive(Debug, Clone)]
pub struct RegistryClient {
    transport: ApiTransport,
}

impl RegistryClient {
    /// Creates a client; it still needs [`RegistryClient::authenticate`]
    /// unless configured for anonymous access
    pub fn new(config: &HttpClientConfig) -> ApiResult<Self> {
        Ok(Self {
            transport: ApiTransport::new("RegistryClient", config)?,
        })
    }

    /// Acquires a session token
    #[instrument(skip(self, password))]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> ApiResult<()> {
        self.transport.authenticate(username, password).await
    }

    /// Current session
    pub fn session(&self) -> &Session {
        self.transport.session()
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    #[instrument(skip(self))]
    async fn list_buckets(&self) -> ApiResult<Vec<Bucket>> {
        debug!("Listing registry buckets");
        self.transport
            .get_json("Get Buckets", "list_buckets", "/buckets")
            .await
    }

    #[instrument(skip(self))]
    async fn list_flows(&self, bucket_id: &str) -> ApiResult<Vec<VersionedFlow>> {
        debug!("Listing flows in bucket");
        self.transport
            .get_json(
                "Get Flows",
                "list_flows",
                &format!("/buckets/{}/flows", bucket_id),
            )
            .await
    }
}
