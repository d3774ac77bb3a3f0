use crate::application::convergence::ConvergenceWaiter;
use crate::application::provisioning::{validate_name, ProvisioningUseCase};
use crate::domain::entities::document_chunk::{
    DocumentChunk, ADDED_AT_KEY, ADDED_BY_KEY, BATCH_ID_KEY, EMBEDDING_DIMENSION_KEY,
    EMBEDDING_MODEL_KEY, TIMESTAMP_FORMAT,
};
use crate::domain::entities::namespace::Scope;
use crate::domain::entities::records::RecordBatch;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::api_result::ApiResult;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub collection_id: String,
    pub batch_id: String,
    pub submitted: usize,
    /// False when the records were accepted but did not become visible
    /// within the convergence timeout.
    pub converged: bool,
}

pub struct IngestUseCase {
    provisioning: Arc<ProvisioningUseCase>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    waiter: ConvergenceWaiter,
    provenance: String,
}

impl IngestUseCase {
    pub fn new(
        provisioning: Arc<ProvisioningUseCase>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        waiter: ConvergenceWaiter,
        provenance: String,
    ) -> Self {
        Self {
            provisioning,
            embedder,
            store,
            waiter,
            provenance,
        }
    }

    /// Embeds, stamps and submits `chunks` as one batch, then waits for the
    /// batch to become visible.
    ///
    /// Nothing reaches the store unless every chunk has exactly one vector of
    /// the configured dimension. Stamps are written into the chunks' metadata
    /// only once that holds.
    pub async fn execute(
        &self,
        collection: &str,
        chunks: &mut [DocumentChunk],
    ) -> Result<IngestReport, DomainError> {
        validate_name(collection)?;
        validate_chunks(chunks)?;

        let collection_id = self.provisioning.resolve(collection).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        check_embeddings(&embeddings, chunks.len(), self.embedder.dimension())?;

        let batch_id = uuid::Uuid::new_v4().to_string();
        self.stamp(chunks, &batch_id);

        let probe = embeddings.first().cloned().unwrap_or_default();
        let batch = RecordBatch {
            ids: chunks.iter().map(|c| c.id.clone()).collect(),
            documents: Some(texts),
            embeddings: Some(embeddings),
            metadatas: Some(chunks.iter().map(|c| c.metadata.clone()).collect()),
            uris: None,
        };

        let Scope { tenant, database } = self.provisioning.scope();
        match self
            .store
            .add_records(tenant, database, &collection_id, &batch)
            .await
        {
            ApiResult::Success { .. } => {}
            ApiResult::Failure { error, status } => {
                if status == 404 {
                    self.provisioning.forget(collection);
                }
                return Err(DomainError::store(status, &error));
            }
        }
        tracing::info!(
            collection = %collection,
            batch_id = %batch_id,
            records = batch.len(),
            "batch submitted"
        );

        let converged = self
            .waiter
            .wait(&collection_id, batch.len(), &probe)
            .await;
        if !converged {
            tracing::warn!(
                collection = %collection,
                batch_id = %batch_id,
                "batch accepted but not yet visible"
            );
        }

        Ok(IngestReport {
            collection_id,
            batch_id,
            submitted: batch.len(),
            converged,
        })
    }

    fn stamp(&self, chunks: &mut [DocumentChunk], batch_id: &str) {
        let added_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        for chunk in chunks.iter_mut() {
            let m = &mut chunk.metadata;
            m.insert(ADDED_BY_KEY.into(), json!(self.provenance));
            m.insert(ADDED_AT_KEY.into(), json!(added_at));
            m.insert(BATCH_ID_KEY.into(), json!(batch_id));
            m.insert(EMBEDDING_MODEL_KEY.into(), json!(self.embedder.model()));
            m.insert(
                EMBEDDING_DIMENSION_KEY.into(),
                json!(self.embedder.dimension()),
            );
        }
    }
}

fn validate_chunks(chunks: &[DocumentChunk]) -> Result<(), DomainError> {
    if chunks.is_empty() {
        return Err(DomainError::InvalidInput("no documents to ingest".into()));
    }
    let mut seen = HashSet::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.id.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!("document #{i} has an empty id")));
        }
        if chunk.content.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "document #{i} ({}) has no content",
                chunk.id
            )));
        }
        if !seen.insert(chunk.id.as_str()) {
            return Err(DomainError::InvalidInput(format!(
                "duplicate document id '{}'",
                chunk.id
            )));
        }
    }
    Ok(())
}

/// One vector per chunk, each of the expected length. Reports every bad
/// position, not just the first.
fn check_embeddings(
    embeddings: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<(), DomainError> {
    if embeddings.len() != expected_count {
        return Err(DomainError::EmbeddingCountMismatch {
            expected: expected_count,
            got: embeddings.len(),
        });
    }
    let offending: Vec<(usize, usize)> = embeddings
        .iter()
        .enumerate()
        .filter(|(_, v)| v.len() != dimension)
        .map(|(i, v)| (i, v.len()))
        .collect();
    if !offending.is_empty() {
        return Err(DomainError::DimensionMismatch {
            expected: dimension,
            offending,
        });
    }
    Ok(())
}
