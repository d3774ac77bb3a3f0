use crate::domain::entities::namespace::Scope;
use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::api_result::ApiResult;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub reachable: bool,
    pub heartbeat_ns: Option<u64>,
    pub version: Option<String>,
    pub max_batch_size: Option<u32>,
    pub error: Option<String>,
}

pub struct HealthUseCase {
    store: Arc<dyn VectorStore>,
    scope: Scope,
}

impl HealthUseCase {
    pub fn new(store: Arc<dyn VectorStore>, scope: Scope) -> Self {
        Self { store, scope }
    }

    pub async fn report(&self) -> HealthReport {
        let (heartbeat_ns, error) = match self.store.heartbeat().await {
            ApiResult::Success { data, .. } => (Some(data.nanosecond_heartbeat), None),
            ApiResult::Failure { error, .. } => (None, Some(error.to_string())),
        };
        if heartbeat_ns.is_none() {
            return HealthReport {
                reachable: false,
                heartbeat_ns,
                version: None,
                max_batch_size: None,
                error,
            };
        }

        HealthReport {
            reachable: true,
            heartbeat_ns,
            version: self.store.version().await.ok(),
            max_batch_size: self
                .store
                .pre_flight_checks()
                .await
                .ok()
                .and_then(|p| p.max_batch_size),
            error: None,
        }
    }

    /// Number of records in the collection with the given id.
    pub async fn count(&self, collection_id: &str) -> Result<u32, DomainError> {
        let Scope { tenant, database } = &self.scope;
        self.store
            .count_records(tenant, database, collection_id)
            .await
            .into_result()
            .map_err(DomainError::from)
    }
}
