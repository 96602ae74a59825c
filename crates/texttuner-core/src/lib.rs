//! TextTuner core — shared types, errors, configuration, and session persistence.
//!
//! # Modules
//!
//! - [`types`] — OpenAI-style chat completion wire types
//! - [`error`] — validation, request, and storage error taxonomy
//! - [`config`] — `~/.texttuner/config.json` schema + loader with env overrides
//! - [`state`] — session state, key-value storage, save/load of the persisted record
//! - [`utils`] — data directory resolution and string helpers

pub mod config;
pub mod error;
pub mod state;
pub mod types;
pub mod utils;

pub use error::{StorageError, TunerError, ValidationError};
pub use state::{ProviderDefaults, SessionState, Settings};
