//! Request orchestrator — builds the uniform chat-completion request,
//! tracks the busy flag, and honours cancellation and timeouts.
//!
//! ```text
//! complete(provider, user_text, system_prompt?, cancel?)
//!   ├─ build_request      model check, [system?] + user
//!   ├─ BusyFlag::acquire  guard released on every exit path
//!   ├─ backend.chat       optionally bounded by timeout
//!   └─ select! cancel     dropped future on cancellation
//! ```
//!
//! `list_models` takes the same busy, timeout, and cancel path.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use texttuner_core::error::ValidationError;
use texttuner_core::types::{ChatCompletionRequest, Message};
use texttuner_core::TunerError;

use crate::settings::ResolvedProvider;
use crate::traits::{ChatBackend, ChatRequest};

// ─────────────────────────────────────────────
// BusyFlag
// ─────────────────────────────────────────────

/// Process-wide "request in flight" indicator for UI feedback.
///
/// Counts in-flight requests, so overlapping calls keep it raised until
/// the last one settles.
#[derive(Clone, Debug, Default)]
pub struct BusyFlag {
    in_flight: Arc<AtomicUsize>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Raise the flag until the returned guard is dropped.
    pub fn acquire(&self) -> BusyGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        BusyGuard { flag: self.clone() }
    }
}

/// Lowers the [`BusyFlag`] on drop.
#[must_use = "the busy flag drops as soon as the guard does"]
pub struct BusyGuard {
    flag: BusyFlag,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

// ─────────────────────────────────────────────
// Request construction
// ─────────────────────────────────────────────

/// Build the request: an optional system message, then exactly one user message.
///
/// A blank system prompt is omitted. An empty model is rejected.
pub fn build_request(
    provider: &ResolvedProvider,
    user_text: &str,
    system_prompt: Option<&str>,
) -> Result<ChatRequest, ValidationError> {
    if provider.model.trim().is_empty() {
        return Err(ValidationError::MissingModel);
    }

    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt.filter(|s| !s.trim().is_empty()) {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(user_text));

    Ok(ChatRequest {
        base_url: provider.base_url.clone(),
        api_key: provider.api_key.clone(),
        body: ChatCompletionRequest {
            model: provider.model.clone(),
            messages,
        },
    })
}

// ─────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────

/// Sends chat completions through a [`ChatBackend`].
///
/// Does not retry. Has no timeout unless one is configured with
/// [`Orchestrator::with_timeout`] or passed to
/// [`Orchestrator::complete_with_timeout`].
pub struct Orchestrator {
    backend: Arc<dyn ChatBackend>,
    busy: BusyFlag,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("backend", &self.backend.display_name())
            .field("busy", &self.busy.is_busy())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            busy: BusyFlag::new(),
            timeout: None,
        }
    }

    /// Share an existing busy flag (e.g. one already watched by a UI).
    pub fn with_busy_flag(mut self, busy: BusyFlag) -> Self {
        self.busy = busy;
        self
    }

    /// Default timeout applied to every `complete()` and `list_models()` call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Send one chat completion and return the first choice's content.
    pub async fn complete(
        &self,
        provider: &ResolvedProvider,
        user_text: &str,
        system_prompt: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, TunerError> {
        self.run(provider, user_text, system_prompt, cancel, self.timeout)
            .await
    }

    /// Like [`complete`](Self::complete) with an explicit timeout.
    pub async fn complete_with_timeout(
        &self,
        provider: &ResolvedProvider,
        user_text: &str,
        system_prompt: Option<&str>,
        cancel: Option<&CancellationToken>,
        timeout: Duration,
    ) -> Result<String, TunerError> {
        self.run(provider, user_text, system_prompt, cancel, Some(timeout))
            .await
    }

    /// Fetch the provider's model list. Honours the configured timeout
    /// and `cancel` like [`complete`](Self::complete).
    pub async fn list_models(
        &self,
        provider: &ResolvedProvider,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<String>, TunerError> {
        let _busy = self.busy.acquire();
        debug!(provider = %provider.provider, base = %provider.base_url, "Listing models");

        let result = bounded(self.backend.list_models(provider), cancel, self.timeout).await;
        match &result {
            Ok(models) => debug!(provider = %provider.provider, count = models.len(), "Models listed"),
            Err(TunerError::Cancelled) => debug!(provider = %provider.provider, "Model listing cancelled"),
            Err(e) => warn!(provider = %provider.provider, error = %e, "Model listing failed"),
        }
        result
    }

    async fn run(
        &self,
        provider: &ResolvedProvider,
        user_text: &str,
        system_prompt: Option<&str>,
        cancel: Option<&CancellationToken>,
        timeout: Option<Duration>,
    ) -> Result<String, TunerError> {
        let request = build_request(provider, user_text, system_prompt)?;

        let _busy = self.busy.acquire();

        debug!(
            backend = self.backend.display_name(),
            provider = %provider.provider,
            model = %request.body.model,
            messages = request.body.messages.len(),
            "Dispatching chat completion"
        );

        let result = bounded(self.backend.chat(&request), cancel, timeout).await;

        match &result {
            Ok(content) => debug!(
                provider = %provider.provider,
                chars = content.chars().count(),
                "Chat completion received"
            ),
            Err(TunerError::Cancelled) => debug!(provider = %provider.provider, "Chat completion cancelled"),
            Err(e) => warn!(provider = %provider.provider, error = %e, "Chat completion failed"),
        }

        result
    }
}

/// Await `call` under an optional timeout, dropping it if `cancel` fires first.
async fn bounded<T>(
    call: impl Future<Output = Result<T, TunerError>>,
    cancel: Option<&CancellationToken>,
    timeout: Option<Duration>,
) -> Result<T, TunerError> {
    let call = async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| TunerError::TimedOut(limit))?,
            None => call.await,
        }
    };

    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(TunerError::Cancelled),
                r = call => r,
            }
        }
        None => call.await,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
