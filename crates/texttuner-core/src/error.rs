//! Error taxonomy shared by every TextTuner crate.
//!
//! - [`ValidationError`] — bad input or missing settings; no request is made.
//! - [`TunerError`] — anything that can go wrong around a chat-completion call.
//! - [`StorageError`] — the persisted state could not be read or written.

use std::time::Duration;

use thiserror::Error;

/// Precondition violations, caught before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("original text is empty")]
    EmptyInput,

    #[error("API key is not configured")]
    MissingApiKey,

    #[error("model is not configured")]
    MissingModel,

    #[error("base URL is not configured for the custom provider")]
    MissingBaseUrl,

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("provider '{0}' uses a fixed base URL; switch to custom to set one")]
    FixedBaseUrl(String),

    #[error("style level {0} is outside the supported range")]
    LevelOutOfRange(i32),

    #[error("imitation topic is empty")]
    EmptyTopic,

    #[error("result slot is empty, nothing to export")]
    NothingToExport,
}

/// Failures of the persisted key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by the request orchestrator and its callers.
#[derive(Debug, Error)]
pub enum TunerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The provider answered with a non-2xx status.
    #[error("request failed with status {status}")]
    RequestFailed { status: u16, body: String },

    /// The provider answered 2xx but the body lacks the expected content path.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request never got an HTTP answer (DNS, connect, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TunerError {
    /// HTTP status carried by a `RequestFailed`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TunerError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
