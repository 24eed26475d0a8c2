//! Ollama completion client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::provider::{Provider, ProviderError};

/// Client for the Ollama `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

/// Request body for `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response body for `/api/generate`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    /// Create a client against an Ollama-compatible base URL.
    ///
    /// `request_timeout` is the only timeout in the system; a completion
    /// that exceeds it surfaces as an unavailable model service.
    pub fn new(base_url: &str, model: &str, request_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api {
                message: format!("unreadable response: {e}"),
            })?;

        if let Some(error) = payload.error {
            return Err(ProviderError::Api { message: error });
        }

        payload.response.ok_or(ProviderError::NoContent)
    }
}
