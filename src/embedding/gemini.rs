//! Gemini embeddings implementation.

use super::Embedder;
use crate::error::{ProviderError, Result};
use crate::gemini::{Content, GeminiClient, DEFAULT_BASE_URL};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Gemini-based embedder using `batchEmbedContents`.
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder.
    pub fn new(api_key: &str, base_url: Option<&str>, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::with_base_url(api_key, base_url.unwrap_or(DEFAULT_BASE_URL), timeout)?,
            model: model.strip_prefix("models/").unwrap_or(model).to_string(),
        })
    }
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
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

        let qualified = format!("models/{}", self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| EmbedRequest {
                    model: &qualified,
                    content: Content::text(None, t),
                })
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .client
            .call(&self.model, "batchEmbedContents", &request)
            .await?;

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn model_id(&self) -> String {
        format!("gemini/{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_normalized() {
        let embedder =
            GeminiEmbedder::new("key", None, "models/text-embedding-004", Duration::from_secs(5)).unwrap();
        assert_eq!(embedder.model_id(), "gemini/text-embedding-004");
    }

    #[test]
    fn test_batch_request_shape() {
        let request = BatchEmbedRequest {
            requests: vec![EmbedRequest {
                model: "models/text-embedding-004",
                content: Content::text(None, "plan de trabajo"),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requests"][0]["model"], "models/text-embedding-004");
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "plan de trabajo");
        assert!(json["requests"][0]["content"].get("role").is_none());
    }

    #[test]
    fn test_batch_response_parsing() {
        let response: BatchEmbedResponse =
            serde_json::from_str(r#"{"embeddings":[{"values":[0.1,0.2]},{"values":[0.3,0.4]}]}"#).unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }
}
