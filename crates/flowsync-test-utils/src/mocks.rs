//! Mock implementations of the API client contracts.

use async_trait::async_trait;
use mockall::mock;

use flowsync_interfaces::{
    ApiResult, Bucket, FlowApi, FlowContents, Position, ProcessGroupEntity, ProcessGroupFlow,
    RegistryApi, RegistryClientEntity, Revision, UpdateRequest, VersionControlInformation,
    VersionedFlow,
};

// Mock the flow-management client
mock! {
    pub FlowApi {}

    #[async_trait]
    impl FlowApi for FlowApi {
        async fn get_root_flow(&self) -> ApiResult<ProcessGroupFlow>;
        async fn get_flow(&self, group_id: &str) -> ApiResult<ProcessGroupFlow>;
        async fn get_group_details(&self, group_id: &str) -> ApiResult<ProcessGroupEntity>;
        async fn list_components(&self, group_id: &str) -> ApiResult<FlowContents>;
        async fn create_change_version_request(
            &self,
            group_id: &str,
            revision: &Revision,
            version_info: &VersionControlInformation,
        ) -> ApiResult<UpdateRequest>;
        async fn get_change_request_status(&self, request_id: &str) -> ApiResult<UpdateRequest>;
        async fn create_child_group(
            &self,
            parent_id: &str,
            version_info: &VersionControlInformation,
            position: Position,
        ) -> ApiResult<ProcessGroupEntity>;
        async fn rename_group(
            &self,
            group_id: &str,
            name: &str,
            revision: &Revision,
        ) -> ApiResult<ProcessGroupEntity>;
        async fn list_registry_connections(&self) -> ApiResult<Vec<RegistryClientEntity>>;
    }
}

// Mock the registry client
mock! {
    pub RegistryApi {}

    #[async_trait]
    impl RegistryApi for RegistryApi {
        async fn list_buckets(&self) -> ApiResult<Vec<Bucket>>;
        async fn list_flows(&self, bucket_id: &str) -> ApiResult<Vec<VersionedFlow>>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_registry_custom_behavior() {
        let mut mock = MockRegistryApi::new();
        mock.expect_list_buckets().times(1).returning(|| {
            Ok(vec![Bucket {
                identifier: "b-1".to_string(),
                name: "prod".to_string(),
            }])
        });

        let buckets = mock.list_buckets().await.unwrap();
        assert_eq!(buckets[0].identifier, "b-1");
    }
}
