//! Embedding generation for semantic search and retrieval.

mod gemini;
mod openai;

pub use gemini::GeminiEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingSettings, ProviderKind, RetrySettings, Settings};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation.
///
/// Implementations issue exactly one provider request per call; retries and
/// batching are decided by the caller.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError>;

    /// Identity of the embedding space, e.g. `openai/text-embedding-3-small`.
    ///
    /// Vectors are only comparable when produced under the same id.
    fn model_id(&self) -> String;
}

/// Create the configured embedder.
pub fn create_embedder(settings: &EmbeddingSettings, retry: &RetrySettings) -> Result<Arc<dyn Embedder>> {
    let api_key = Settings::api_key(&settings.api_key_env())?;
    let timeout = Duration::from_secs(retry.request_timeout_secs);
    let model = settings.model();

    let embedder: Arc<dyn Embedder> = match settings.provider {
        ProviderKind::OpenAI => Arc::new(OpenAIEmbedder::new(
            &api_key,
            settings.base_url.as_deref(),
            &model,
            settings.dimensions,
            timeout,
        )?),
        ProviderKind::Gemini => Arc::new(GeminiEmbedder::new(
            &api_key,
            settings.base_url.as_deref(),
            &model,
            timeout,
        )?),
    };

    Ok(embedder)
}
