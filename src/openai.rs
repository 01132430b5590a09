//! OpenAI client construction and error mapping.

use crate::error::{ConsultaError, ProviderError, Result};
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use std::time::Duration;

/// OpenAI client type used throughout the crate.
pub type OpenAIClient = Client<OpenAIConfig>;

/// Create an OpenAI client with the given key and request timeout.
///
/// The client's own rate-limit backoff is disabled; retries are driven by
/// [`crate::retry::RetryPolicy`].
pub fn create_client(api_key: &str, base_url: Option<&str>, timeout: Duration) -> Result<OpenAIClient> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConsultaError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = base_url {
        config = config.with_api_base(base);
    }

    let no_backoff = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_backoff))
}

/// Map an OpenAI client error onto the provider error taxonomy.
pub fn map_error(e: OpenAIError) -> ProviderError {
    match e {
        OpenAIError::Reqwest(e) => ProviderError::from(e),
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.clone().unwrap_or_default();
            let code = api.code.clone().unwrap_or_default();
            let transient = kind == "server_error"
                || code == "rate_limit_exceeded"
                || api.message.to_lowercase().contains("overloaded");
            ProviderError::Api {
                message: api.message,
                transient,
            }
        }
        OpenAIError::JSONDeserialize(e) => ProviderError::Malformed(e.to_string()),
        OpenAIError::InvalidArgument(msg) => ProviderError::InvalidRequest(msg),
        other => ProviderError::Transport(other.to_string()),
    }
}
