//! Chat backend trait — the transport seam under the orchestrator.
//!
//! [`HttpBackend`](crate::http_provider::HttpBackend) is the real
//! implementation; tests plug in stubs to observe requests and control
//! timing without a network.

use async_trait::async_trait;
use texttuner_core::types::ChatCompletionRequest;
use texttuner_core::utils::mask_secret;
use texttuner_core::TunerError;

use crate::settings::ResolvedProvider;

/// One fully-built chat completion call.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// API base, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Bearer credential.
    pub api_key: String,
    /// JSON body `{model, messages}`.
    pub body: ChatCompletionRequest,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("body", &self.body)
            .finish()
    }
}

/// Something that can execute chat completions and list models.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one chat completion and return the first choice's content.
    ///
    /// Errors are `RequestFailed` (non-2xx), `MalformedResponse`, or
    /// `Transport`. No retries.
    async fn chat(&self, request: &ChatRequest) -> Result<String, TunerError>;

    /// `GET {base}/models`, returning the model identifiers.
    async fn list_models(&self, provider: &ResolvedProvider) -> Result<Vec<String>, TunerError>;

    /// Name for logging.
    fn display_name(&self) -> &str;
}
