use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TITLE_KEY: &str = "title";
pub const CATEGORY_KEY: &str = "category";

/// Provenance keys stamped onto every stored chunk.
pub const ADDED_BY_KEY: &str = "added_by";
pub const ADDED_AT_KEY: &str = "added_at";
pub const BATCH_ID_KEY: &str = "batch_id";
pub const EMBEDDING_MODEL_KEY: &str = "embedding_model";
pub const EMBEDDING_DIMENSION_KEY: &str = "embedding_dimension";

/// UTC, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A unit of text stored in (or returned from) a collection.
///
/// `distance` is only populated on search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    #[serde(default = "new_id")]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self::with_id(new_id(), content, metadata)
    }

    pub fn with_id(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
            distance: None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata_str(TITLE_KEY)
    }

    pub fn category(&self) -> Option<&str> {
        self.metadata_str(CATEGORY_KEY)
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
