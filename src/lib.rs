pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;

use crate::application::convergence::ConvergenceWaiter;
use crate::application::health::{HealthReport, HealthUseCase};
use crate::application::ingest::{IngestReport, IngestUseCase};
use crate::application::provisioning::{CollectionTemplate, ProvisioningUseCase};
use crate::application::search::SearchUseCase;
use crate::config::{EmbeddingBackend, RagConfig};
use crate::domain::entities::document_chunk::DocumentChunk;
use crate::domain::entities::namespace::Scope;
use crate::domain::entities::source_document::SourceDocument;
use crate::domain::error::DomainError;
use crate::domain::ports::collection_directory::CollectionDirectory;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::vector_store::VectorStore;
use crate::infrastructure::chroma::ChromaClient;
use crate::infrastructure::directory::InMemoryDirectory;
use crate::infrastructure::embeddings::ollama::OllamaProvider;
use crate::infrastructure::embeddings::openai::OpenAiProvider;
use std::sync::Arc;

/// Entry point for chat-side callers.
///
/// The plain methods (`ensure_collection`, `ingest`, `search`,
/// `delete_collection`) log store and embedding failures and report them as
/// `false` / no results. Only invalid caller input comes back as `Err`, and
/// it does so before any network call. The `*_detailed` variants and the
/// use-case accessors keep the full error.
pub struct RagStore {
    provisioning: Arc<ProvisioningUseCase>,
    ingest_uc: IngestUseCase,
    search_uc: SearchUseCase,
    health_uc: HealthUseCase,
}

impl RagStore {
    pub fn new(config: RagConfig) -> Self {
        let store: Arc<dyn VectorStore> = Arc::new(ChromaClient::from_config(&config));
        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
            EmbeddingBackend::Ollama => Arc::new(OllamaProvider::new(
                config.embedding_model.clone(),
                config.embedding_dimension,
                Some(config.embedding_url.clone()),
            )),
            EmbeddingBackend::OpenAi => Arc::new(OpenAiProvider::new(
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                config.embedding_dimension,
                Some(config.embedding_url.clone()),
            )),
        };

        Self::with_providers(&config, store, embedder, Arc::new(InMemoryDirectory::new()))
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Ok(Self::new(RagConfig::from_env()?))
    }

    pub fn with_providers(
        config: &RagConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        directory: Arc<dyn CollectionDirectory>,
    ) -> Self {
        let scope = Scope::new(config.tenant.clone(), config.database.clone());
        let template = CollectionTemplate {
            index: config.index.clone(),
            embedding_model: embedder.model().to_string(),
            embedding_dimension: embedder.dimension(),
            created_by: config.provenance.clone(),
        };

        let provisioning = Arc::new(ProvisioningUseCase::new(
            store.clone(),
            directory,
            scope.clone(),
            template,
        ));
        let waiter =
            ConvergenceWaiter::new(store.clone(), scope.clone(), config.convergence.clone());

        Self {
            ingest_uc: IngestUseCase::new(
                provisioning.clone(),
                embedder.clone(),
                store.clone(),
                waiter,
                config.provenance.clone(),
            ),
            search_uc: SearchUseCase::new(provisioning.clone(), embedder, store.clone()),
            health_uc: HealthUseCase::new(store, scope),
            provisioning,
        }
    }

    pub fn provisioning(&self) -> &ProvisioningUseCase {
        &self.provisioning
    }

    // Collapsing contract

    pub async fn ensure_collection(&self, name: &str) -> Result<bool, DomainError> {
        let result = self.provisioning.ensure_collection(name).await;
        settle("ensure_collection", name, result.map(|_| true), false)
    }

    pub async fn ingest(
        &self,
        name: &str,
        chunks: &mut [DocumentChunk],
    ) -> Result<bool, DomainError> {
        let result = self.ingest_uc.execute(name, chunks).await;
        settle("ingest", name, result.map(|_| true), false)
    }

    pub async fn search(
        &self,
        name: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let result = self.search_uc.execute(name, query, limit).await;
        settle("search", name, result, Vec::new())
    }

    /// Search results reshaped for citation display.
    pub async fn search_sources(
        &self,
        name: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SourceDocument>, DomainError> {
        let chunks = self.search(name, query, limit).await?;
        Ok(chunks.iter().map(SourceDocument::from).collect())
    }

    pub async fn delete_collection(&self, name: &str) -> Result<bool, DomainError> {
        let result = self.provisioning.delete_collection(name).await;
        settle("delete_collection", name, result.map(|_| true), false)
    }

    // Full-error variants

    pub async fn ingest_detailed(
        &self,
        name: &str,
        chunks: &mut [DocumentChunk],
    ) -> Result<IngestReport, DomainError> {
        self.ingest_uc.execute(name, chunks).await
    }

    pub async fn search_detailed(
        &self,
        name: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        self.search_uc.execute(name, query, limit).await
    }

    pub async fn resolve(&self, name: &str) -> Result<String, DomainError> {
        self.provisioning.resolve(name).await
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool, DomainError> {
        self.provisioning.collection_exists(name).await
    }

    pub async fn count(&self, name: &str) -> Result<u32, DomainError> {
        let id = self.provisioning.resolve(name).await?;
        self.health_uc.count(&id).await
    }

    pub async fn health(&self) -> HealthReport {
        self.health_uc.report().await
    }
}

fn settle<T>(
    operation: &str,
    collection: &str,
    result: Result<T, DomainError>,
    fallback: T,
) -> Result<T, DomainError> {
    match result {
        Ok(value) => Ok(value),
        Err(e @ DomainError::InvalidInput(_)) => Err(e),
        Err(e) => {
            tracing::error!(operation, collection = %collection, error = %e, "operation failed");
            Ok(fallback)
        }
    }
}
