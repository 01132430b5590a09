//! Configuration module for Consulta.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    CompletionSettings, DocumentSettings, EmbeddingSettings, GeneralSettings, PromptSettings,
    ProviderKind, RetrievalSettings, RetrySettings, ServerSettings, Settings,
};
