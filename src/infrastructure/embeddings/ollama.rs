use crate::config::DEFAULT_OLLAMA_URL;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Local Ollama server, `POST /api/embed`.
pub struct OllamaProvider {
    client: Client,
    model: String,
    dimension: usize,
    base_url: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn new(model: String, dimension: usize, base_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            model,
            dimension,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| DomainError::Embedding(format!("Ollama API error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Embedding(format!("Ollama API {status}: {body}")));
        }

        let result: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Embedding(format!("Parse error: {e}")))?;
        tracing::debug!(
            model = %self.model,
            requested = texts.len(),
            returned = result.embeddings.len(),
            "ollama embeddings"
        );
        Ok(result.embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
