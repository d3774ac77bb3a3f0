//! Record-level payloads: add/update/upsert/delete/get/query.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Include {
    Documents,
    Embeddings,
    Metadatas,
    Distances,
    Uris,
}

/// Parallel arrays describing a set of records. Position `i` in every
/// present array refers to the same record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordBatch {
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Metadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Every present column has exactly one entry per id.
    pub fn is_aligned(&self) -> bool {
        let n = self.ids.len();
        self.documents.as_ref().map_or(true, |d| d.len() == n)
            && self.embeddings.as_ref().map_or(true, |e| e.len() == n)
            && self.metadatas.as_ref().map_or(true, |m| m.len() == n)
            && self.uris.as_ref().map_or(true, |u| u.len() == n)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteRecords {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetRecords {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Value>,
    pub include: Vec<Include>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetRecordsResponse {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Option<Vec<f32>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Value>>>,
    #[serde(default)]
    pub uris: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub include: Vec<Include>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRecords {
    pub query_embeddings: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_results: Option<u32>,
    pub include: Vec<Include>,
}

/// One result set per query embedding; inner arrays are positionally aligned.
/// Metadata rows stay as raw JSON so one odd row cannot fail the whole decode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Value>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<Option<Vec<f32>>>>>,
    #[serde(default)]
    pub uris: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub include: Vec<Include>,
}

impl QueryResponse {
    /// Rows returned for the query at `query_index`.
    pub fn row_count(&self, query_index: usize) -> usize {
        let from_metadata = self
            .metadatas
            .as_ref()
            .and_then(|m| m.get(query_index))
            .map(Vec::len);
        let from_ids = self.ids.get(query_index).map(Vec::len);
        from_metadata.or(from_ids).unwrap_or(0)
    }
}
