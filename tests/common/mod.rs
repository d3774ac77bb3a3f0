//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use ragstore::config::{ConvergenceConfig, RagConfig};
use ragstore::domain::entities::document_chunk::DocumentChunk;
use ragstore::domain::entities::namespace::{
    Collection, CreateCollection, CreateDatabase, CreateTenant, Database, Page, Tenant,
    UpdateCollection,
};
use ragstore::domain::entities::records::{
    DeleteRecords, GetRecords, GetRecordsResponse, QueryRecords, QueryResponse, RecordBatch,
};
use ragstore::domain::entities::server::{Heartbeat, PreFlightChecks, UserIdentity};
use ragstore::domain::error::DomainError;
use ragstore::domain::ports::embedding_port::EmbeddingProvider;
use ragstore::domain::ports::vector_store::VectorStore;
use ragstore::domain::values::api_error::ApiError;
use ragstore::domain::values::api_result::ApiResult;
use ragstore::infrastructure::directory::InMemoryDirectory;
use ragstore::RagStore;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub const DIMENSION: usize = 4;

pub fn config() -> RagConfig {
    RagConfig::default()
        .with_embedding("fake-embed", DIMENSION)
        .with_convergence(ConvergenceConfig {
            timeout: Duration::from_secs(5),
            initial_interval: Duration::from_millis(20),
            step: Duration::from_millis(10),
            max_interval: Duration::from_millis(50),
            verify_cap: 1000,
        })
}

pub fn setup(store: Arc<FakeStore>, embedder: Arc<FakeEmbedder>) -> RagStore {
    RagStore::with_providers(&config(), store, embedder, Arc::new(InMemoryDirectory::new()))
}

pub fn chunk(id: &str, title: &str, content: &str) -> DocumentChunk {
    let mut metadata = Map::new();
    metadata.insert("title".into(), json!(title));
    DocumentChunk::with_id(id, content, metadata)
}

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub metadata: Map<String, Value>,
}

#[derive(Default)]
struct State {
    tenants: Vec<String>,
    databases: Vec<String>,
    collections: Vec<Collection>,
    records: HashMap<String, Vec<StoredRecord>>,
    add_batches: Vec<RecordBatch>,
    queries: Vec<QueryRecords>,
}

/// In-memory stand-in for the vector store, with knobs for the failure
/// modes the orchestration has to survive.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
    next_id: AtomicUsize,
    pub list_collections_calls: AtomicUsize,
    pub create_collection_calls: AtomicUsize,
    pub delete_collection_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    /// Count polls answered with 0 before the real count shows up.
    pub count_lag: AtomicUsize,
    /// Records are never counted.
    pub never_visible: AtomicBool,
    /// Status returned by `add_records` instead of storing.
    pub fail_add_status: AtomicUsize,
    /// Status returned by `create_collection` instead of creating.
    pub fail_create_status: AtomicUsize,
    /// Count polls answered with a 503 before the store behaves again.
    pub count_failures: AtomicUsize,
    /// Milliseconds every count poll takes to answer.
    pub count_delay_ms: AtomicU64,
    race: Option<Barrier>,
    query_override: Mutex<Option<QueryResponse>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The first two collection listings wait for each other, so two
    /// concurrent provisioners both see the collection as missing.
    pub fn racing() -> Arc<Self> {
        Arc::new(Self {
            race: Some(Barrier::new(2)),
            ..Self::default()
        })
    }

    pub fn with_collection(self: &Arc<Self>, name: &str) -> String {
        let id = self.new_collection_id();
        let mut state = self.state.lock().unwrap();
        state.collections.push(collection(&id, name));
        id
    }

    /// Drops a collection behind the service's back, as another process would.
    pub fn drop_collection(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let dropped: Vec<String> = state
            .collections
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.id.clone())
            .collect();
        state.collections.retain(|c| c.name != name);
        for id in dropped {
            state.records.remove(&id);
        }
    }

    pub fn collection_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.collections.iter().map(|c| c.id.clone()).collect()
    }

    pub fn set_query_response(&self, response: QueryResponse) {
        *self.query_override.lock().unwrap() = Some(response);
    }

    pub fn add_batches(&self) -> Vec<RecordBatch> {
        self.state.lock().unwrap().add_batches.clone()
    }

    pub fn queries(&self) -> Vec<QueryRecords> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn collection_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.collections.iter().map(|c| c.name.clone()).collect()
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.list_collections_calls,
            &self.create_collection_calls,
            &self.delete_collection_calls,
            &self.add_calls,
            &self.count_calls,
            &self.query_calls,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    fn new_collection_id(&self) -> String {
        format!("col-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn status_knob(knob: &AtomicUsize) -> Option<u16> {
        match knob.load(Ordering::SeqCst) {
            0 => None,
            status => Some(status as u16),
        }
    }
}

fn collection(id: &str, name: &str) -> Collection {
    serde_json::from_value(json!({"id": id, "name": name})).unwrap()
}

fn not_found<T>(what: &str) -> ApiResult<T> {
    ApiResult::failure(
        ApiError::new(format!("{what} does not exist"), Some("NotFoundError".into())),
        404,
    )
}

fn unsupported<T>() -> ApiResult<T> {
    ApiResult::fail("not supported by fake", 501, None)
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn heartbeat(&self) -> ApiResult<Heartbeat> {
        ApiResult::success(
            Heartbeat {
                nanosecond_heartbeat: 1,
            },
            200,
        )
    }

    async fn healthcheck(&self) -> ApiResult<String> {
        ApiResult::success("ok".into(), 200)
    }

    async fn version(&self) -> ApiResult<String> {
        ApiResult::success("fake".into(), 200)
    }

    async fn pre_flight_checks(&self) -> ApiResult<PreFlightChecks> {
        ApiResult::success(
            PreFlightChecks {
                max_batch_size: Some(100),
            },
            200,
        )
    }

    async fn user_identity(&self) -> ApiResult<UserIdentity> {
        unsupported()
    }

    async fn reset(&self) -> ApiResult<bool> {
        unsupported()
    }

    async fn get_tenant(&self, tenant: &str) -> ApiResult<Tenant> {
        let state = self.state.lock().unwrap();
        if state.tenants.iter().any(|t| t == tenant) {
            ApiResult::success(
                Tenant {
                    name: tenant.to_string(),
                },
                200,
            )
        } else {
            not_found("tenant")
        }
    }

    async fn create_tenant(&self, payload: &CreateTenant) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.tenants.contains(&payload.name) {
            return ApiResult::fail("Tenant already exists", 409, Some("UniqueConstraintError"));
        }
        state.tenants.push(payload.name.clone());
        ApiResult::success((), 200)
    }

    async fn list_databases(&self, _tenant: &str, _page: Page) -> ApiResult<Vec<Database>> {
        let state = self.state.lock().unwrap();
        let databases = state
            .databases
            .iter()
            .map(|name| Database {
                id: None,
                name: name.clone(),
                tenant: None,
            })
            .collect();
        ApiResult::success(databases, 200)
    }

    async fn create_database(&self, _tenant: &str, payload: &CreateDatabase) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.databases.contains(&payload.name) {
            return ApiResult::fail("Database already exists", 409, Some("UniqueConstraintError"));
        }
        state.databases.push(payload.name.clone());
        ApiResult::success((), 200)
    }

    async fn get_database(&self, _tenant: &str, _database: &str) -> ApiResult<Database> {
        unsupported()
    }

    async fn delete_database(&self, _tenant: &str, _database: &str) -> ApiResult<()> {
        unsupported()
    }

    async fn list_collections(
        &self,
        _tenant: &str,
        _database: &str,
        _page: Page,
    ) -> ApiResult<Vec<Collection>> {
        let call = self.list_collections_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.race {
            if call < 2 {
                barrier.wait().await;
            }
        }
        let state = self.state.lock().unwrap();
        ApiResult::success(state.collections.clone(), 200)
    }

    async fn create_collection(
        &self,
        _tenant: &str,
        _database: &str,
        payload: &CreateCollection,
    ) -> ApiResult<Collection> {
        self.create_collection_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = Self::status_knob(&self.fail_create_status) {
            return ApiResult::fail("create rejected", status, Some("InternalError"));
        }
        let id = self.new_collection_id();
        let mut state = self.state.lock().unwrap();
        if state.collections.iter().any(|c| c.name == payload.name) {
            return ApiResult::fail(
                format!("Collection {} already exists", payload.name),
                409,
                Some("UniqueConstraintError"),
            );
        }
        let created = collection(&id, &payload.name);
        state.collections.push(created.clone());
        ApiResult::success(created, 200)
    }

    async fn get_collection(
        &self,
        _tenant: &str,
        _database: &str,
        _collection_id: &str,
    ) -> ApiResult<Collection> {
        unsupported()
    }

    async fn update_collection(
        &self,
        _tenant: &str,
        _database: &str,
        _collection_id: &str,
        _payload: &UpdateCollection,
    ) -> ApiResult<()> {
        unsupported()
    }

    async fn delete_collection(
        &self,
        _tenant: &str,
        _database: &str,
        collection_id: &str,
    ) -> ApiResult<()> {
        self.delete_collection_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let before = state.collections.len();
        state.collections.retain(|c| c.id != collection_id);
        if state.collections.len() == before {
            return not_found("collection");
        }
        state.records.remove(collection_id);
        ApiResult::success((), 200)
    }

    async fn count_collections(&self, _tenant: &str, _database: &str) -> ApiResult<u32> {
        let state = self.state.lock().unwrap();
        ApiResult::success(state.collections.len() as u32, 200)
    }

    async fn add_records(
        &self,
        _tenant: &str,
        _database: &str,
        collection_id: &str,
        batch: &RecordBatch,
    ) -> ApiResult<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = Self::status_knob(&self.fail_add_status) {
            return ApiResult::fail("add rejected", status, Some("InternalError"));
        }
        let mut state = self.state.lock().unwrap();
        if !state.collections.iter().any(|c| c.id == collection_id) {
            return not_found("collection");
        }
        state.add_batches.push(batch.clone());
        let documents = batch.documents.clone().unwrap_or_default();
        let embeddings = batch.embeddings.clone().unwrap_or_default();
        let metadatas = batch.metadatas.clone().unwrap_or_default();
        let records = state.records.entry(collection_id.to_string()).or_default();
        for (i, id) in batch.ids.iter().enumerate() {
            records.push(StoredRecord {
                id: id.clone(),
                document: documents.get(i).cloned().unwrap_or_default(),
                embedding: embeddings.get(i).cloned().unwrap_or_default(),
                metadata: metadatas.get(i).cloned().unwrap_or_default(),
            });
        }
        ApiResult::success((), 201)
    }

    async fn update_records(
        &self,
        _tenant: &str,
        _database: &str,
        _collection_id: &str,
        _batch: &RecordBatch,
    ) -> ApiResult<()> {
        unsupported()
    }

    async fn upsert_records(
        &self,
        _tenant: &str,
        _database: &str,
        _collection_id: &str,
        _batch: &RecordBatch,
    ) -> ApiResult<()> {
        unsupported()
    }

    async fn delete_records(
        &self,
        _tenant: &str,
        _database: &str,
        _collection_id: &str,
        _payload: &DeleteRecords,
    ) -> ApiResult<()> {
        unsupported()
    }

    async fn get_records(
        &self,
        _tenant: &str,
        _database: &str,
        _collection_id: &str,
        _payload: &GetRecords,
    ) -> ApiResult<GetRecordsResponse> {
        unsupported()
    }

    async fn query_records(
        &self,
        _tenant: &str,
        _database: &str,
        collection_id: &str,
        payload: &QueryRecords,
        _page: Page,
    ) -> ApiResult<QueryResponse> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.queries.push(payload.clone());
        if let Some(response) = self.query_override.lock().unwrap().clone() {
            return ApiResult::success(response, 200);
        }
        if !state.collections.iter().any(|c| c.id == collection_id) {
            return not_found("collection");
        }

        let limit = payload.n_results.unwrap_or(10) as usize;
        let records: Vec<StoredRecord> = state
            .records
            .get(collection_id)
            .map(|r| r.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        let response = json!({
            "ids": [records.iter().map(|r| r.id.clone()).collect::<Vec<_>>()],
            "documents": [records.iter().map(|r| r.document.clone()).collect::<Vec<_>>()],
            "metadatas": [records.iter().map(|r| Value::Object(r.metadata.clone())).collect::<Vec<_>>()],
            "distances": [(0..records.len()).map(|i| i as f64 * 0.1).collect::<Vec<_>>()],
        });
        ApiResult::success(serde_json::from_value(response).unwrap(), 200)
    }

    async fn count_records(
        &self,
        _tenant: &str,
        _database: &str,
        collection_id: &str,
    ) -> ApiResult<u32> {
        let call = self.count_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.count_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if call < self.count_failures.load(Ordering::SeqCst) {
            return ApiResult::fail("Service Unavailable", 503, None);
        }
        if self.never_visible.load(Ordering::SeqCst) || call < self.count_lag.load(Ordering::SeqCst)
        {
            return ApiResult::success(0, 200);
        }
        let state = self.state.lock().unwrap();
        let count = state.records.get(collection_id).map_or(0, Vec::len);
        ApiResult::success(count as u32, 200)
    }
}

/// How the fake embedder misbehaves.
#[derive(Debug, Clone, Default)]
pub enum EmbedFault {
    #[default]
    None,
    /// Returns one vector fewer than asked for.
    DropLast,
    /// Vectors at these positions come back one element short.
    ShortAt(Vec<usize>),
    Fail,
}

/// Vector `i` of a batch starts with `i`, so alignment can be checked after
/// the fact.
pub struct FakeEmbedder {
    fault: EmbedFault,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Arc<Self> {
        Self::with_fault(EmbedFault::None)
    }

    pub fn with_fault(fault: EmbedFault) -> Arc<Self> {
        Arc::new(Self {
            fault,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vectors: Vec<Vec<f32>> = texts
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let mut v = vec![0.5; DIMENSION];
                v[0] = i as f32;
                v
            })
            .collect();
        match &self.fault {
            EmbedFault::None => {}
            EmbedFault::DropLast => {
                vectors.pop();
            }
            EmbedFault::ShortAt(positions) => {
                for &p in positions {
                    if let Some(v) = vectors.get_mut(p) {
                        v.pop();
                    }
                }
            }
            EmbedFault::Fail => {
                return Err(DomainError::Embedding("embedding server down".into()));
            }
        }
        Ok(vectors)
    }

    fn model(&self) -> &str {
        "fake-embed"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}
