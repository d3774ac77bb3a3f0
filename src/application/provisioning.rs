use crate::domain::entities::document_chunk::{
    EMBEDDING_DIMENSION_KEY, EMBEDDING_MODEL_KEY, TIMESTAMP_FORMAT,
};
use crate::domain::entities::namespace::{
    CollectionConfiguration, CreateCollection, CreateDatabase, CreateTenant, IndexConfig, Page,
    Scope,
};
use crate::domain::error::DomainError;
use crate::domain::ports::collection_directory::CollectionDirectory;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::api_result::ApiResult;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Settings applied to every collection this service creates.
#[derive(Debug, Clone)]
pub struct CollectionTemplate {
    pub index: IndexConfig,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub created_by: String,
}

impl CollectionTemplate {
    fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("description".into(), json!("Document chunks for retrieval"));
        metadata.insert(EMBEDDING_MODEL_KEY.into(), json!(self.embedding_model));
        metadata.insert(EMBEDDING_DIMENSION_KEY.into(), json!(self.embedding_dimension));
        metadata.insert("created_by".into(), json!(self.created_by));
        metadata.insert(
            "created_at".into(),
            json!(Utc::now().format(TIMESTAMP_FORMAT).to_string()),
        );
        metadata
    }

    fn create_payload(&self, name: &str) -> CreateCollection {
        CreateCollection {
            name: name.to_string(),
            get_or_create: true,
            metadata: Some(self.metadata()),
            configuration: Some(CollectionConfiguration {
                hnsw: Some(self.index.clone()),
            }),
        }
    }
}

/// Idempotent tenant → database → collection provisioning, plus name → id
/// resolution through the shared directory.
pub struct ProvisioningUseCase {
    store: Arc<dyn VectorStore>,
    directory: Arc<dyn CollectionDirectory>,
    scope: Scope,
    template: CollectionTemplate,
}

impl ProvisioningUseCase {
    pub fn new(
        store: Arc<dyn VectorStore>,
        directory: Arc<dyn CollectionDirectory>,
        scope: Scope,
        template: CollectionTemplate,
    ) -> Self {
        Self {
            store,
            directory,
            scope,
            template,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub async fn ensure_tenant(&self) -> Result<(), DomainError> {
        let tenant = &self.scope.tenant;
        match self.store.get_tenant(tenant).await {
            ApiResult::Success { .. } => return Ok(()),
            ApiResult::Failure { error, status } => {
                tracing::debug!(tenant = %tenant, status, error = %error, "tenant lookup failed, creating");
            }
        }

        let payload = CreateTenant {
            name: tenant.clone(),
        };
        match self.store.create_tenant(&payload).await {
            ApiResult::Success { .. } => {
                tracing::info!(tenant = %tenant, "tenant created");
                Ok(())
            }
            ApiResult::Failure { error, .. } if error.is_conflict() => {
                tracing::debug!(tenant = %tenant, "tenant created concurrently");
                Ok(())
            }
            ApiResult::Failure { error, status } => Err(DomainError::store(status, &error)),
        }
    }

    pub async fn ensure_database(&self) -> Result<(), DomainError> {
        let Scope { tenant, database } = &self.scope;
        match self.store.list_databases(tenant, Page::default()).await {
            ApiResult::Success { data, .. } if data.iter().any(|db| &db.name == database) => {
                return Ok(());
            }
            ApiResult::Success { .. } => {}
            ApiResult::Failure { error, status } => {
                tracing::debug!(database = %database, status, error = %error, "database listing failed, creating");
            }
        }

        let payload = CreateDatabase {
            name: database.clone(),
        };
        match self.store.create_database(tenant, &payload).await {
            ApiResult::Success { .. } => {
                tracing::info!(tenant = %tenant, database = %database, "database created");
                Ok(())
            }
            ApiResult::Failure { error, .. } if error.is_conflict() => {
                tracing::debug!(database = %database, "database created concurrently");
                Ok(())
            }
            ApiResult::Failure { error, status } => Err(DomainError::store(status, &error)),
        }
    }

    /// Looks the collection up by name in a live listing. The listing wins
    /// over the directory, so a hit overwrites any cached entry. A failed
    /// listing is an error, not a miss.
    pub async fn collection_exists(&self, name: &str) -> Result<bool, DomainError> {
        Ok(self.lookup(name).await?.is_some())
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>, DomainError> {
        let Scope { tenant, database } = &self.scope;
        match self
            .store
            .list_collections(tenant, database, Page::default())
            .await
        {
            ApiResult::Success { data, .. } => match data.into_iter().find(|c| c.name == name) {
                Some(c) => {
                    self.directory.put(name, c.id.clone());
                    Ok(Some(c.id))
                }
                None => Ok(None),
            },
            ApiResult::Failure { error, status } => Err(DomainError::store(status, &error)),
        }
    }

    /// Makes sure tenant, database and collection exist, creating whatever is
    /// missing. Concurrent callers converge on one identifier. Returns it.
    pub async fn ensure_collection(&self, name: &str) -> Result<String, DomainError> {
        validate_name(name)?;
        self.ensure_tenant().await?;
        self.ensure_database().await?;

        if let Some(id) = self.lookup(name).await? {
            return Ok(id);
        }

        let Scope { tenant, database } = &self.scope;
        let payload = self.template.create_payload(name);
        match self
            .store
            .create_collection(tenant, database, &payload)
            .await
        {
            ApiResult::Success { data, .. } => {
                let id = self.directory.get_or_insert(name, data.id);
                tracing::info!(collection = %name, id = %id, "collection created");
                Ok(id)
            }
            ApiResult::Failure { error, .. } if error.is_conflict() => {
                tracing::debug!(collection = %name, "collection created concurrently");
                self.lookup(name).await?.ok_or_else(|| {
                    DomainError::NotFound(format!(
                        "collection '{name}' reported as existing but not listed"
                    ))
                })
            }
            ApiResult::Failure { error, status } => Err(DomainError::store(status, &error)),
        }
    }

    /// Name → id, from the directory when possible, else from one live check.
    pub async fn resolve(&self, name: &str) -> Result<String, DomainError> {
        if let Some(id) = self.directory.get(name) {
            return Ok(id);
        }
        self.lookup(name)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("collection '{name}'")))
    }

    /// Drops a directory entry the store no longer recognises.
    pub fn forget(&self, name: &str) {
        if self.directory.remove(name).is_some() {
            tracing::debug!(collection = %name, "dropped stale directory entry");
        }
    }

    /// Deletes the collection. Deleting a collection that does not exist
    /// succeeds.
    pub async fn delete_collection(&self, name: &str) -> Result<(), DomainError> {
        let id = match self.resolve(name).await {
            Ok(id) => id,
            Err(DomainError::NotFound(_)) => {
                tracing::info!(collection = %name, "collection already absent");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self.delete_by_id(name, &id).await? {
            return Ok(());
        }

        // The cached id was stale; the name may now belong to a newer collection.
        match self.lookup(name).await? {
            Some(live) if live != id => {
                tracing::debug!(collection = %name, stale = %id, id = %live, "retrying delete with live id");
                self.delete_by_id(name, &live).await?;
            }
            _ => tracing::info!(collection = %name, "collection already absent"),
        }
        Ok(())
    }

    /// False when the store does not know `id`.
    async fn delete_by_id(&self, name: &str, id: &str) -> Result<bool, DomainError> {
        let Scope { tenant, database } = &self.scope;
        match self.store.delete_collection(tenant, database, id).await {
            ApiResult::Success { .. } => {
                self.directory.remove(name);
                tracing::info!(collection = %name, id = %id, "collection deleted");
                Ok(true)
            }
            ApiResult::Failure { status: 404, .. } => {
                self.directory.remove(name);
                Ok(false)
            }
            ApiResult::Failure { error, status } => Err(DomainError::store(status, &error)),
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidInput(
            "collection name must not be empty".into(),
        ));
    }
    Ok(())
}
