//! OpenAI chat completions implementation.

use super::{Completer, CompletionRequest};
use crate::error::{ProviderError, Result};
use crate::openai::{create_client, map_error, OpenAIClient};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based completer.
pub struct OpenAICompleter {
    client: OpenAIClient,
    model: String,
}

impl OpenAICompleter {
    /// Create a new OpenAI completer.
    pub fn new(api_key: &str, base_url: Option<&str>, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key, base_url, timeout)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Completer for OpenAICompleter {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, ProviderError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(map_error)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(map_error)?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .build()
            .map_err(map_error)?;

        let response = self.client.chat().create(chat_request).await.map_err(map_error)?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::Malformed("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model_id(&self) -> String {
        format!("openai/{}", self.model)
    }
}
