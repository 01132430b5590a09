//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{ProviderError, Result};
use crate::openai::{create_client, map_error, OpenAIClient};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: OpenAIClient,
    model: String,
    dimensions: Option<u32>,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(
        api_key: &str,
        base_url: Option<&str>,
        model: &str,
        dimensions: Option<u32>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key, base_url, timeout)?,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model)
            .input(EmbeddingInput::StringArray(texts.to_vec()));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args.build().map_err(map_error)?;

        let response = self.client.embeddings().create(request).await.map_err(map_error)?;

        // Sort by index to ensure correct order
        let mut data = response.data;
        data.sort_by_key(|e| e.index);

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }

    fn model_id(&self) -> String {
        match self.dimensions {
            Some(d) => format!("openai/{}@{}", self.model, d),
            None => format!("openai/{}", self.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_includes_dimensions() {
        let timeout = Duration::from_secs(5);
        let embedder = OpenAIEmbedder::new("sk-test", None, "text-embedding-3-small", None, timeout).unwrap();
        assert_eq!(embedder.model_id(), "openai/text-embedding-3-small");

        let embedder =
            OpenAIEmbedder::new("sk-test", None, "text-embedding-3-large", Some(256), timeout).unwrap();
        assert_eq!(embedder.model_id(), "openai/text-embedding-3-large@256");
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embedder = OpenAIEmbedder::new(
            "sk-test",
            Some("http://127.0.0.1:9/v1"),
            "text-embedding-3-small",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }
}
