use super::transport::{execute, json, scalar, unit};
use crate::config::{AuthHeader, RagConfig};
use crate::domain::entities::namespace::{
    Collection, CreateCollection, CreateDatabase, CreateTenant, Database, Page, Tenant,
    UpdateCollection,
};
use crate::domain::entities::records::{
    DeleteRecords, GetRecords, GetRecordsResponse, QueryRecords, QueryResponse, RecordBatch,
};
use crate::domain::entities::server::{Heartbeat, PreFlightChecks, UserIdentity};
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::api_result::ApiResult;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use std::time::Duration;

const API_PREFIX: &str = "api/v2";
const TOKEN_HEADER: &str = "x-chroma-token";

/// HTTP client for a Chroma server (v2 API).
pub struct ChromaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    auth_header: AuthHeader,
}

impl ChromaClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        auth_header: AuthHeader,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("ragstore/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            auth_header,
        }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(
            config.chroma_url.clone(),
            config.chroma_api_key.clone(),
            config.auth_header,
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{API_PREFIX}/{path}", self.base_url);
        let builder = self.client.request(method, url);
        match (&self.api_key, self.auth_header) {
            (None, _) => builder,
            (Some(key), AuthHeader::ChromaToken) => builder.header(TOKEN_HEADER, key),
            (Some(key), AuthHeader::Bearer) => builder.bearer_auth(key),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }
}

fn database_path(tenant: &str, database: &str) -> String {
    format!("tenants/{tenant}/databases/{database}")
}

fn collection_path(tenant: &str, database: &str, collection_id: &str) -> String {
    format!(
        "{}/collections/{collection_id}",
        database_path(tenant, database)
    )
}

#[async_trait]
impl VectorStore for ChromaClient {
    async fn heartbeat(&self) -> ApiResult<Heartbeat> {
        execute(self.get("heartbeat"), json).await
    }

    async fn healthcheck(&self) -> ApiResult<String> {
        execute(self.get("healthcheck"), |body| Ok(body.trim().to_string())).await
    }

    async fn version(&self) -> ApiResult<String> {
        execute(self.get("version"), scalar).await
    }

    async fn pre_flight_checks(&self) -> ApiResult<PreFlightChecks> {
        execute(self.get("pre-flight-checks"), json).await
    }

    async fn user_identity(&self) -> ApiResult<UserIdentity> {
        execute(self.get("auth/identity"), json).await
    }

    async fn reset(&self) -> ApiResult<bool> {
        execute(self.post("reset"), scalar).await
    }

    async fn get_tenant(&self, tenant: &str) -> ApiResult<Tenant> {
        execute(self.get(&format!("tenants/{tenant}")), json).await
    }

    async fn create_tenant(&self, payload: &CreateTenant) -> ApiResult<()> {
        execute(self.post("tenants").json(payload), unit).await
    }

    async fn list_databases(&self, tenant: &str, page: Page) -> ApiResult<Vec<Database>> {
        let request = self
            .get(&format!("tenants/{tenant}/databases"))
            .query(&page.query_pairs());
        execute(request, json).await
    }

    async fn create_database(&self, tenant: &str, payload: &CreateDatabase) -> ApiResult<()> {
        let request = self
            .post(&format!("tenants/{tenant}/databases"))
            .json(payload);
        execute(request, unit).await
    }

    async fn get_database(&self, tenant: &str, database: &str) -> ApiResult<Database> {
        execute(self.get(&database_path(tenant, database)), json).await
    }

    async fn delete_database(&self, tenant: &str, database: &str) -> ApiResult<()> {
        let request = self.request(Method::DELETE, &database_path(tenant, database));
        execute(request, unit).await
    }

    async fn list_collections(
        &self,
        tenant: &str,
        database: &str,
        page: Page,
    ) -> ApiResult<Vec<Collection>> {
        let request = self
            .get(&format!("{}/collections", database_path(tenant, database)))
            .query(&page.query_pairs());
        execute(request, json).await
    }

    async fn create_collection(
        &self,
        tenant: &str,
        database: &str,
        payload: &CreateCollection,
    ) -> ApiResult<Collection> {
        let request = self
            .post(&format!("{}/collections", database_path(tenant, database)))
            .json(payload);
        execute(request, json).await
    }

    async fn get_collection(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
    ) -> ApiResult<Collection> {
        execute(
            self.get(&collection_path(tenant, database, collection_id)),
            json,
        )
        .await
    }

    async fn update_collection(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &UpdateCollection,
    ) -> ApiResult<()> {
        let request = self
            .request(Method::PUT, &collection_path(tenant, database, collection_id))
            .json(payload);
        execute(request, unit).await
    }

    async fn delete_collection(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
    ) -> ApiResult<()> {
        let request = self.request(
            Method::DELETE,
            &collection_path(tenant, database, collection_id),
        );
        execute(request, unit).await
    }

    async fn count_collections(&self, tenant: &str, database: &str) -> ApiResult<u32> {
        let path = format!("{}/collections_count", database_path(tenant, database));
        execute(self.get(&path), scalar).await
    }

    async fn add_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()> {
        let path = format!("{}/add", collection_path(tenant, database, collection_id));
        execute(self.post(&path).json(batch), unit).await
    }

    async fn update_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()> {
        let path = format!("{}/update", collection_path(tenant, database, collection_id));
        execute(self.post(&path).json(batch), unit).await
    }

    async fn upsert_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()> {
        let path = format!("{}/upsert", collection_path(tenant, database, collection_id));
        execute(self.post(&path).json(batch), unit).await
    }

    async fn delete_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &DeleteRecords,
    ) -> ApiResult<()> {
        let path = format!("{}/delete", collection_path(tenant, database, collection_id));
        execute(self.post(&path).json(payload), unit).await
    }

    async fn get_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &GetRecords,
    ) -> ApiResult<GetRecordsResponse> {
        let path = format!("{}/get", collection_path(tenant, database, collection_id));
        execute(self.post(&path).json(payload), json).await
    }

    async fn query_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
        payload: &QueryRecords,
        page: Page,
    ) -> ApiResult<QueryResponse> {
        let path = format!("{}/query", collection_path(tenant, database, collection_id));
        let request = self
            .post(&path)
            .query(&page.query_pairs())
            .json(payload);
        execute(request, json).await
    }

    async fn count_records(
        &self,
        tenant: &str,
        database: &str,
        collection_id: &str,
    ) -> ApiResult<u32> {
        let path = format!("{}/count", collection_path(tenant, database, collection_id));
        execute(self.get(&path), scalar).await
    }
}
