//! Error types for Consulta.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Consulta operations.
#[derive(Error, Debug)]
pub enum ConsultaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Failed to load document {}: {message}", path.display())]
    DocumentLoad { path: PathBuf, message: String },

    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(#[source] ProviderError),

    #[error("Embedding space mismatch: index built with {index}, query embedded with {query}")]
    EmbeddingSpaceMismatch { index: String, query: String },

    #[error("Answer synthesis failed: {0}")]
    Synthesis(#[source] ProviderError),

    #[error("Index build failed: {0}")]
    IndexBuild(#[source] Arc<ConsultaError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ConsultaError {
    /// Whether this error was caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConsultaError::Validation(_))
    }
}

/// Failure of a single call to a hosted embedding or completion provider.
///
/// Provider error bodies are opaque to Consulta; the only decision taken on
/// them is whether another attempt may succeed.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider API error: {message}")]
    Api { message: String, transient: bool },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            ProviderError::Api { transient, .. } => *transient,
            ProviderError::Malformed(_) | ProviderError::InvalidRequest(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(Duration::ZERO)
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Result type alias for Consulta operations.
pub type Result<T> = std::result::Result<T, ConsultaError>;
