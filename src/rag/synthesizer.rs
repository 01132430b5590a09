//! Grounded answer generation from retrieved context.

use super::context::{format_context_for_prompt, RetrievedContext};
use crate::completion::{Completer, CompletionRequest};
use crate::config::Prompts;
use crate::error::{ConsultaError, Result};
use crate::retry::RetryPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Turns a question and its context into an answer via a hosted LLM.
pub struct Synthesizer {
    completer: Arc<dyn Completer>,
    prompts: Prompts,
    temperature: f32,
    retry: RetryPolicy,
}

impl Synthesizer {
    /// Create a new synthesizer with default prompts.
    pub fn new(completer: Arc<dyn Completer>, retry: RetryPolicy) -> Self {
        Self {
            completer,
            prompts: Prompts::default(),
            temperature: 0.2,
            retry,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Render the prompt for `question` over `context`.
    pub fn build_request(&self, question: &str, context: &RetrievedContext) -> CompletionRequest {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(context));

        CompletionRequest {
            system: self.prompts.render_with_custom(&self.prompts.rag.system, &HashMap::new()),
            prompt: self.prompts.render_with_custom(&self.prompts.rag.user, &vars),
            temperature: self.temperature,
        }
    }

    /// Generate the answer text.
    ///
    /// With no context the configured fallback answer is returned and the
    /// model is not called.
    #[instrument(skip(self, question, context), fields(passages = context.len()))]
    pub async fn synthesize(&self, question: &str, context: &RetrievedContext) -> Result<String> {
        if context.is_empty() {
            info!("No relevant passages, returning fallback answer");
            return Ok(self.prompts.rag.no_context_answer.clone());
        }

        let request = self.build_request(question, context);

        let answer = self
            .retry
            .run("complete", || self.completer.complete(&request))
            .await
            .map_err(ConsultaError::Synthesis)?;

        debug!(model = %self.completer.model_id(), "Generated answer");
        Ok(answer)
    }
}
