//! Runtime configuration, read from the environment with local defaults.

use crate::domain::entities::namespace::IndexConfig;
use crate::domain::error::DomainError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;

/// Header carrying the store credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthHeader {
    /// `x-chroma-token: <key>`
    #[default]
    ChromaToken,
    /// `Authorization: Bearer <key>`
    Bearer,
}

impl FromStr for AuthHeader {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x-chroma-token" | "chroma-token" | "token" => Ok(AuthHeader::ChromaToken),
            "authorization" | "bearer" => Ok(AuthHeader::Bearer),
            _ => Err(format!("Unknown auth header: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    #[default]
    Ollama,
    OpenAi,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(EmbeddingBackend::Ollama),
            "openai" => Ok(EmbeddingBackend::OpenAi),
            _ => Err(format!("Unknown embedding provider: {s}")),
        }
    }
}

/// Polling policy for waiting on eventually-consistent writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceConfig {
    pub timeout: Duration,
    pub initial_interval: Duration,
    pub step: Duration,
    pub max_interval: Duration,
    /// Result cap for the confirmatory similarity query.
    pub verify_cap: u32,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            initial_interval: Duration::from_millis(2000),
            step: Duration::from_millis(500),
            max_interval: Duration::from_millis(5000),
            verify_cap: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub chroma_url: String,
    pub chroma_api_key: Option<String>,
    pub auth_header: AuthHeader,
    pub tenant: String,
    pub database: String,
    pub request_timeout: Duration,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    /// Written to `added_by` / `created_by` on everything this service stores.
    pub provenance: String,
    pub index: IndexConfig,
    pub convergence: ConvergenceConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chroma_url: DEFAULT_CHROMA_URL.to_string(),
            chroma_api_key: None,
            auth_header: AuthHeader::default(),
            tenant: "default".to_string(),
            database: "default".to_string(),
            request_timeout: Duration::from_secs(30),
            embedding_backend: EmbeddingBackend::default(),
            embedding_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            provenance: "ragstore".to_string(),
            index: IndexConfig::default(),
            convergence: ConvergenceConfig::default(),
        }
    }
}

impl RagConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let embedding_backend = match get("RAGSTORE_EMBEDDING_PROVIDER") {
            Some(v) => v.parse().map_err(DomainError::Config)?,
            None => defaults.embedding_backend,
        };
        let embedding_url = match embedding_backend {
            EmbeddingBackend::Ollama => get("OLLAMA_URL").unwrap_or(defaults.embedding_url),
            EmbeddingBackend::OpenAi => get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        };

        let mut convergence = defaults.convergence;
        if let Some(secs) = parse_var::<u64>(&get, "RAGSTORE_CONVERGENCE_TIMEOUT_SECS")? {
            convergence.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            chroma_url: get("CHROMA_URL").unwrap_or(defaults.chroma_url),
            chroma_api_key: get("CHROMA_API_KEY"),
            auth_header: match get("CHROMA_AUTH_HEADER") {
                Some(v) => v.parse().map_err(DomainError::Config)?,
                None => defaults.auth_header,
            },
            tenant: get("RAGSTORE_TENANT").unwrap_or(defaults.tenant),
            database: get("RAGSTORE_DATABASE").unwrap_or(defaults.database),
            request_timeout: parse_var::<u64>(&get, "RAGSTORE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            embedding_backend,
            embedding_url,
            embedding_api_key: get("RAGSTORE_EMBEDDING_API_KEY"),
            embedding_model: get("RAGSTORE_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dimension: parse_var::<usize>(&get, "RAGSTORE_EMBEDDING_DIMENSION")?
                .unwrap_or(defaults.embedding_dimension),
            provenance: get("RAGSTORE_PROVENANCE").unwrap_or(defaults.provenance),
            index: defaults.index,
            convergence,
        })
    }

    pub fn with_chroma_url(mut self, url: impl Into<String>) -> Self {
        self.chroma_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.chroma_api_key = Some(key.into());
        self
    }

    pub fn with_embedding(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimension = dimension;
        self
    }

    pub fn with_convergence(mut self, convergence: ConvergenceConfig) -> Self {
        self.convergence = convergence;
        self
    }
}

fn parse_var<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, DomainError> {
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DomainError::Config(format!("{key} has invalid value '{raw}'"))),
    }
}
