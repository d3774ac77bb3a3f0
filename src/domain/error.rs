use crate::domain::values::api_error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding count mismatch: expected {expected}, got {got}")]
    EmbeddingCountMismatch { expected: usize, got: usize },

    #[error("Embedding dimension mismatch (expected {expected}): {}", describe_offending(.offending))]
    DimensionMismatch {
        expected: usize,
        /// `(position in batch, actual length)` for every bad vector.
        offending: Vec<(usize, usize)>,
    },

    #[error("Store error (HTTP {status}): {message}")]
    Store {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn store(status: u16, error: &ApiError) -> Self {
        DomainError::Store {
            status,
            message: error.message.clone(),
            code: error.code.clone(),
        }
    }
}

impl From<(u16, ApiError)> for DomainError {
    fn from((status, error): (u16, ApiError)) -> Self {
        DomainError::store(status, &error)
    }
}

fn describe_offending(offending: &[(usize, usize)]) -> String {
    offending
        .iter()
        .map(|(index, len)| format!("#{index}={len}"))
        .collect::<Vec<_>>()
        .join(", ")
}
