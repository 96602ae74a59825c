//! HTTP backend for OpenAI-compatible APIs.
//!
//! Talks directly to `{base}/chat/completions` and `{base}/models` via
//! `reqwest`. The same client serves every provider; only the base URL,
//! model, and bearer key differ.

use async_trait::async_trait;
use tracing::{debug, error};

use texttuner_core::TunerError;

use crate::decode::{decode_completion, decode_model_list};
use crate::settings::ResolvedProvider;
use crate::traits::{ChatBackend, ChatRequest};

// ─────────────────────────────────────────────
// HttpBackend
// ─────────────────────────────────────────────

/// Chat backend that issues real HTTP requests.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend with a fresh client.
    ///
    /// No client-level timeout is set; timeouts are the orchestrator's job.
    pub fn new() -> Result<Self, TunerError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("texttuner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TunerError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a backend around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn endpoint(base_url: &str, path: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    }

    /// Build the full chat completions URL.
    pub fn completions_url(base_url: &str) -> String {
        Self::endpoint(base_url, "chat/completions")
    }

    /// Build the full model list URL.
    pub fn models_url(base_url: &str) -> String {
        Self::endpoint(base_url, "models")
    }

    async fn read_body(response: reqwest::Response) -> Result<(u16, String), TunerError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TunerError::Transport(format!("failed to read response body: {e}")))?;
        Ok((status, body))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String, TunerError> {
        let url = Self::completions_url(&request.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&request.api_key)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "HTTP request failed");
                TunerError::Transport(e.to_string())
            })?;

        let (status, body) = Self::read_body(response).await?;
        debug!(url = %url, status, bytes = body.len(), "Chat completion response");

        if !(200..300).contains(&status) {
            error!(url = %url, status, body = %body, "API error");
        }

        decode_completion(status, &body)
    }

    async fn list_models(&self, provider: &ResolvedProvider) -> Result<Vec<String>, TunerError> {
        let url = Self::models_url(&provider.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&provider.api_key)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "HTTP request failed");
                TunerError::Transport(e.to_string())
            })?;

        let (status, body) = Self::read_body(response).await?;
        debug!(url = %url, status, "Model list response");

        decode_model_list(status, &body)
    }

    fn display_name(&self) -> &str {
        "http"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
