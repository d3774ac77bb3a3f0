//! Tenant → database → collection hierarchy and its request payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub configuration_json: Option<Value>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub log_position: Option<i64>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub dimension: Option<u32>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Distance function used by the collection index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    L2,
    Cosine,
    Ip,
}

/// HNSW index parameters sent when a collection is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<Space>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ef_construction: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ef_search: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_neighbors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_threshold: Option<u32>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            space: Some(Space::Cosine),
            ef_construction: Some(200),
            ef_search: Some(200),
            max_neighbors: Some(16),
            resize_factor: Some(1.2),
            sync_threshold: Some(1000),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hnsw: Option<IndexConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTenant {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDatabase {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCollection {
    pub name: String,
    pub get_or_create: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<CollectionConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCollection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_metadata: Option<Map<String, Value>>,
}

/// The tenant and database every collection operation is addressed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub tenant: String,
    pub database: String,
}

impl Scope {
    pub fn new(tenant: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            database: database.into(),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new("default", "default")
    }
}

/// Offset pagination for list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}
