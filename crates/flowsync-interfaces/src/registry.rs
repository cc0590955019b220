//! Flow registry interfaces

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// A registry bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Bucket id
    pub identifier: String,
    /// Display name
    pub name: String,
}

/// A versioned flow stored in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedFlow {
    /// Flow id
    pub identifier: String,

    /// Display name
    pub name: String,

    /// Owning bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_identifier: Option<String>,

    /// Number of versions stored for the flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_count: Option<i64>,
}

/// Contract for the registry API client
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Contract: Lists all buckets visible to the client.
    async fn list_buckets(&self) -> ApiResult<Vec<Bucket>>;

    /// Contract: Lists the flows stored in `bucket_id`.
    async fn list_flows(&self, bucket_id: &str) -> ApiResult<Vec<VersionedFlow>>;
}
