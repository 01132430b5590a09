//! Gemini `generateContent` implementation.

use super::{Completer, CompletionRequest};
use crate::error::{ProviderError, Result};
use crate::gemini::{Content, GeminiClient, DEFAULT_BASE_URL};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Gemini-based completer.
pub struct GeminiCompleter {
    client: GeminiClient,
    model: String,
}

impl GeminiCompleter {
    /// Create a new Gemini completer.
    pub fn new(api_key: &str, base_url: Option<&str>, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::with_base_url(api_key, base_url.unwrap_or(DEFAULT_BASE_URL), timeout)?,
            model: model.strip_prefix("models/").unwrap_or(model).to_string(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[async_trait]
impl Completer for GeminiCompleter {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, ProviderError> {
        let body = GenerateRequest {
            system_instruction: Content::text(None, &request.system),
            contents: vec![Content::text(Some("user"), &request.prompt)],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        };

        let response: GenerateResponse = self.client.call(&self.model, "generateContent", &body).await?;

        match response.text() {
            Some(answer) => {
                debug!("Generated {} characters", answer.len());
                Ok(answer)
            }
            None => {
                let reason = response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
                    .unwrap_or_else(|| "no candidates".to_string());
                Err(ProviderError::Malformed(format!("Empty response from LLM ({})", reason)))
            }
        }
    }

    fn model_id(&self) -> String {
        format!("gemini/{}", self.model)
    }
}
