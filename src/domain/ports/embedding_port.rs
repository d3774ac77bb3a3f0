use crate::domain::error::DomainError;

/// Turns text into fixed-dimension vectors.
///
/// `embed_batch` must return exactly one vector per input, in input order.
/// A provider that cannot embed one item fails the whole call instead of
/// dropping or substituting it.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Embedding("provider returned no embedding".into()))
    }

    /// Model name recorded alongside stored vectors.
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;
}
