//! Chat completion providers used for answer synthesis.

mod gemini;
mod openai;

pub use gemini::GeminiCompleter;
pub use openai::OpenAICompleter;

use crate::config::{CompletionSettings, ProviderKind, RetrySettings, Settings};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instructions.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Trait for chat completion.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Generate the assistant's reply text.
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, ProviderError>;

    /// Identity of the model, e.g. `gemini/gemini-2.0-flash-lite`.
    fn model_id(&self) -> String;
}

/// Create the configured completer.
pub fn create_completer(settings: &CompletionSettings, retry: &RetrySettings) -> Result<Arc<dyn Completer>> {
    let api_key = Settings::api_key(&settings.api_key_env())?;
    let timeout = Duration::from_secs(retry.request_timeout_secs);
    let model = settings.model();

    let completer: Arc<dyn Completer> = match settings.provider {
        ProviderKind::OpenAI => Arc::new(OpenAICompleter::new(
            &api_key,
            settings.base_url.as_deref(),
            &model,
            timeout,
        )?),
        ProviderKind::Gemini => Arc::new(GeminiCompleter::new(
            &api_key,
            settings.base_url.as_deref(),
            &model,
            timeout,
        )?),
    };

    Ok(completer)
}
