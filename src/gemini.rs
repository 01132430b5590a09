//! Minimal client for the Gemini Generative Language REST API.

use crate::error::{ConsultaError, ProviderError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// HTTP client bound to one API key and base URL.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl GeminiClient {
    /// Create a client against the default endpoint.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ConsultaError::Config("Gemini API key must not be empty".to_string()));
        }

        // Url::join drops the last path segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ConsultaError::Config(format!("Invalid Gemini base URL {}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsultaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// URL for `models/{model}:{method}`.
    pub fn method_url(&self, model: &str, method: &str) -> std::result::Result<Url, ProviderError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        self.base_url
            .join(&format!("models/{}:{}", model, method))
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))
    }

    /// POST a JSON body to a model method and decode the JSON reply.
    pub async fn call<Req, Resp>(
        &self,
        model: &str,
        method: &str,
        body: &Req,
    ) -> std::result::Result<Resp, ProviderError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.method_url(model, method)?;
        debug!(%url, "Calling Gemini API");

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// A `Content` object with text parts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Single-part text content.
    pub fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(String::from),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

/// One part of a `Content`; only text parts are used.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
