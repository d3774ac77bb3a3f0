use crate::domain::entities::namespace::{
    Collection, CreateCollection, CreateDatabase, CreateTenant, Database, Page, Tenant,
    UpdateCollection,
};
use crate::domain::entities::records::{
    DeleteRecords, GetRecords, GetRecordsResponse, QueryRecords, QueryResponse, RecordBatch,
};
use crate::domain::entities::server::{Heartbeat, PreFlightChecks, UserIdentity};
use crate::domain::values::api_result::ApiResult;
use async_trait::async_trait;

/// One operation per endpoint of the vector store's HTTP API.
///
/// Implementations never retry and never panic on a non-2xx status; every
/// outcome, including transport faults, comes back as an [`ApiResult`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn heartbeat(&self) -> ApiResult<Heartbeat>;
    async fn healthcheck(&self) -> ApiResult<String>;
    async fn version(&self) -> ApiResult<String>;
    async fn pre_flight_checks(&self) -> ApiResult<PreFlightChecks>;
    async fn user_identity(&self) -> ApiResult<UserIdentity>;
    async fn reset(&self) -> ApiResult<bool>;

    async fn get_tenant(&self, tenant: &str) -> ApiResult<Tenant>;
    async fn create_tenant(&self, payload: &CreateTenant) -> ApiResult<()>;

    async fn list_databases(&self, tenant: &str, page: Page) -> ApiResult<Vec<Database>>;
    async fn create_database(&self, tenant: &str, payload: &CreateDatabase) -> ApiResult<()>;
    async fn get_database(&self, tenant: &str, database: &str) -> ApiResult<Database>;
    async fn delete_database(&self, tenant: &str, database: &str) -> ApiResult<()>;

    async fn list_collections(
        &self,
        tenant: &str,
        database: &str,
        page: Page,
    ) -> ApiResult<Vec<Collection>>;
    async fn create_collection(
        &self,
        tenant: &str,
        database: &str,
        payload: &CreateCollection,
    ) -> ApiResult<Collection>;
    async fn get_collection(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
    ) -> ApiResult<Collection>;
    async fn update_collection(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &UpdateCollection,
    ) -> ApiResult<()>;
    async fn delete_collection(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
    ) -> ApiResult<()>;
    async fn count_collections(&self, tenant: &str, database: &str) -> ApiResult<u32>;

    async fn add_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()>;
    async fn update_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()>;
    async fn upsert_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()>;
    async fn delete_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &DeleteRecords,
    ) -> ApiResult<()>;
    async fn get_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &GetRecords,
    ) -> ApiResult<GetRecordsResponse>;
    async fn query_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &QueryRecords,
        page: Page,
    ) -> ApiResult<QueryResponse>;
    async fn count_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
    ) -> ApiResult<u32>;
}
