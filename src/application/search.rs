use crate::application::provisioning::{validate_name, ProvisioningUseCase};
use crate::domain::entities::document_chunk::DocumentChunk;
use crate::domain::entities::namespace::{Page, Scope};
use crate::domain::entities::records::{Include, QueryRecords, QueryResponse};
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::api_result::ApiResult;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Candidates fetched per requested result, leaving room for duplicates.
const OVERFETCH_FACTOR: usize = 2;

pub struct SearchUseCase {
    provisioning: Arc<ProvisioningUseCase>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl SearchUseCase {
    pub fn new(
        provisioning: Arc<ProvisioningUseCase>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            provisioning,
            embedder,
            store,
        }
    }

    /// Nearest chunks to `query`, at most one per title, best first.
    pub async fn execute(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        validate_name(collection)?;
        if query.trim().is_empty() {
            return Err(DomainError::InvalidInput("query must not be empty".into()));
        }
        if limit == 0 {
            return Err(DomainError::InvalidInput("limit must be at least 1".into()));
        }

        let collection_id = self.provisioning.resolve(collection).await?;
        let vector = self.embedder.embed(query).await?;
        if vector.is_empty() {
            return Err(DomainError::Embedding("empty query embedding".into()));
        }

        let n_results = u32::try_from(limit.saturating_mul(OVERFETCH_FACTOR)).unwrap_or(u32::MAX);
        let payload = QueryRecords {
            query_embeddings: vec![vector],
            n_results: Some(n_results),
            include: vec![Include::Documents, Include::Metadatas, Include::Distances],
            ..Default::default()
        };

        let Scope { tenant, database } = self.provisioning.scope();
        let response = match self
            .store
            .query_records(tenant, database, &collection_id, &payload, Page::default())
            .await
        {
            ApiResult::Success { data, .. } => data,
            ApiResult::Failure { error, status } => {
                if status == 404 {
                    self.provisioning.forget(collection);
                }
                return Err(DomainError::store(status, &error));
            }
        };

        let results = unique_by_title(&response, limit);
        tracing::debug!(
            collection = %collection,
            candidates = response.row_count(0),
            returned = results.len(),
            "search complete"
        );
        Ok(results)
    }
}

/// Walks the first result set in rank order, keeping the first chunk seen
/// for each title. Rows without a title are keyed `Document {n}` by rank.
/// Malformed rows are skipped.
pub fn unique_by_title(response: &QueryResponse, limit: usize) -> Vec<DocumentChunk> {
    let Some(ids) = response.ids.first() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(limit.min(ids.len()));
    for i in 0..ids.len() {
        if results.len() >= limit {
            break;
        }
        let chunk = match row(response, i) {
            Ok(chunk) => chunk,
            Err(reason) => {
                tracing::warn!(row = i, reason, "skipping malformed search row");
                continue;
            }
        };
        let key = chunk
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Document {}", i + 1));
        if seen.insert(key) {
            results.push(chunk);
        }
    }
    results
}

fn row(response: &QueryResponse, i: usize) -> Result<DocumentChunk, &'static str> {
    let id = response
        .ids
        .first()
        .and_then(|ids| ids.get(i))
        .filter(|id| !id.is_empty())
        .ok_or("missing id")?;

    let content = response
        .documents
        .as_ref()
        .and_then(|d| d.first())
        .and_then(|d| d.get(i))
        .and_then(Option::as_ref)
        .ok_or("missing document")?;

    let metadata = match response
        .metadatas
        .as_ref()
        .and_then(|m| m.first())
        .and_then(|m| m.get(i))
    {
        None | Some(None) | Some(Some(Value::Null)) => Default::default(),
        Some(Some(Value::Object(map))) => map.clone(),
        Some(Some(_)) => return Err("metadata is not an object"),
    };

    let distance = match response
        .distances
        .as_ref()
        .and_then(|d| d.first())
        .and_then(|d| d.get(i))
        .copied()
        .flatten()
    {
        Some(d) if !d.is_finite() => return Err("distance is not finite"),
        other => other,
    };

    let mut chunk = DocumentChunk::with_id(id.clone(), content.clone(), metadata);
    chunk.distance = distance;
    Ok(chunk)
}
