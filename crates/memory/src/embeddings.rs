use async_trait::async_trait;

/// Computes a vector representation of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    ///
    /// `Ok(None)` means no representation was produced (blank input, empty
    /// provider response). It is not an error.
    async fn embed(&self, text: &str) -> anyhow::Result<Option<Vec<f32>>>;

    /// Embed several texts in one call. The result has one entry per input,
    /// in order.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Model name (e.g. "text-embedding-3-small").
    fn model_name(&self) -> &str;
}
