//! Provider layer for TextTuner.
//!
//! # Architecture
//!
//! - [`registry::ProviderRegistry`] — known backends (OpenAI, Google, custom)
//! - [`settings`] — resolve settings into an endpoint, apply user updates
//! - [`orchestrator::Orchestrator`] — uniform chat completion with busy flag,
//!   cancellation, and optional timeout
//! - [`traits::ChatBackend`] — transport seam
//! - [`http_provider::HttpBackend`] — reqwest implementation for any
//!   OpenAI-compatible API
//! - [`decode`] — status + body → content or a named error

pub mod decode;
pub mod http_provider;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::HttpBackend;
pub use orchestrator::{build_request, BusyFlag, BusyGuard, Orchestrator};
pub use registry::{ProviderRegistry, ProviderSpec};
pub use settings::{resolve, select_provider, ResolvedProvider, SettingsUpdate};
pub use traits::{ChatBackend, ChatRequest};
pub use tokio_util::sync::CancellationToken;
