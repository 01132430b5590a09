//! Configuration settings for Consulta.

use crate::error::{ConsultaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub documents: DocumentSettings,
    pub embedding: EmbeddingSettings,
    pub completion: CompletionSettings,
    pub retrieval: RetrievalSettings,
    pub retry: RetrySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Build the index at start-up instead of on the first question.
    pub warm_up: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            warm_up: false,
        }
    }
}

/// Source documents to index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// PDF files, in ingestion order.
    pub paths: Vec<String>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            paths: vec!["data/pt_adn.pdf".to_string(), "data/pt_r5.pdf".to_string()],
        }
    }
}

/// Hosted model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI API.
    #[default]
    OpenAI,
    /// Google Gemini (Generative Language API).
    Gemini,
}

impl ProviderKind {
    /// Environment variable holding the API key by default.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Embedding model used when none is configured.
    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "text-embedding-3-small",
            ProviderKind::Gemini => "text-embedding-004",
        }
    }

    /// Completion model used when none is configured.
    pub fn default_completion_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Gemini => "gemini-2.0-flash-lite",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, gemini).
    pub provider: ProviderKind,
    /// Embedding model to use. Defaults by provider.
    pub model: Option<String>,
    /// Requested output dimensions (OpenAI text-embedding-3 models only).
    pub dimensions: Option<u32>,
    /// Number of passages sent per embedding request.
    pub batch_size: usize,
    /// Environment variable holding the API key. Defaults by provider.
    pub api_key_env: Option<String>,
    /// Override for the provider's API base URL.
    pub base_url: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: None,
            dimensions: None,
            batch_size: 64,
            api_key_env: None,
            base_url: None,
        }
    }
}

impl EmbeddingSettings {
    /// Configured model, or the provider's default.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_embedding_model().to_string())
    }

    /// Name of the environment variable holding the API key.
    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| self.provider.default_api_key_env().to_string())
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Completion provider (openai, gemini).
    pub provider: ProviderKind,
    /// LLM model for answer generation. Defaults by provider.
    pub model: Option<String>,
    /// Sampling temperature. Kept low for grounded answers.
    pub temperature: f32,
    /// Environment variable holding the API key. Defaults by provider.
    pub api_key_env: Option<String>,
    /// Override for the provider's API base URL.
    pub base_url: Option<String>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: None,
            temperature: 0.2,
            api_key_env: None,
            base_url: None,
        }
    }
}

impl CompletionSettings {
    /// Configured model, or the provider's default.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_completion_model().to_string())
    }

    /// Name of the environment variable holding the API key.
    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| self.provider.default_api_key_env().to_string())
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages handed to the synthesizer.
    pub top_k: usize,
    /// Drop passages scoring below this similarity.
    pub min_score: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: None,
        }
    }
}

/// Provider retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum delay between retries, in milliseconds.
    pub max_backoff_ms: u64,
    /// Timeout for each provider request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 5000,
            request_timeout_secs: 60,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        let mut variables = std::collections::HashMap::new();
        variables.insert("language".to_string(), "Spanish".to_string());
        Self {
            custom_dir: None,
            variables,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(ConsultaError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(paths) = lookup("CONSULTA_DOCUMENTS") {
            self.documents.paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(top_k) = lookup("CONSULTA_TOP_K") {
            self.retrieval.top_k = parse_var("CONSULTA_TOP_K", &top_k)?;
        }
        if let Some(temperature) = lookup("CONSULTA_TEMPERATURE") {
            self.completion.temperature = parse_var("CONSULTA_TEMPERATURE", &temperature)?;
        }
        if let Some(retries) = lookup("CONSULTA_MAX_RETRIES") {
            self.retry.max_retries = parse_var("CONSULTA_MAX_RETRIES", &retries)?;
        }
        if let Some(provider) = lookup("CONSULTA_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse().map_err(ConsultaError::Config)?;
        }
        if let Some(provider) = lookup("CONSULTA_COMPLETION_PROVIDER") {
            self.completion.provider = provider.parse().map_err(ConsultaError::Config)?;
        }
        self.validate()
    }

    /// Check values that would otherwise fail much later.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(ConsultaError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConsultaError::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConsultaError::Config(format!(
                "completion.temperature must be between 0.0 and 2.0, got {}",
                self.completion.temperature
            )));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("consulta")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded document paths.
    pub fn document_paths(&self) -> Vec<PathBuf> {
        self.documents
            .paths
            .iter()
            .map(|p| Self::expand_path(p))
            .collect()
    }

    /// Read an API key from the named environment variable.
    pub fn api_key(env_name: &str) -> Result<String> {
        match std::env::var(env_name) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(ConsultaError::Config(format!("{} is empty", env_name))),
            Err(_) => Err(ConsultaError::Config(format!("{} not set", env_name))),
        }
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConsultaError::Config(format!("Invalid value for {}: {} ({})", name, value, e)))
}
