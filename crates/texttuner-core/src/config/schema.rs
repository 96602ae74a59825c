//! Configuration schema for `~/.texttuner/config.json`.
//!
//! Hierarchy: `Config` → `RequestConfig`, `StorageConfig`, `ExportConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! Provider selection and the API key are *not* here; they live in the
//! persisted session state (see [`crate::state`]).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration, loaded from `~/.texttuner/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub request: RequestConfig,
    pub storage: StorageConfig,
    pub export: ExportConfig,
}

// ─────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────

/// What to do when a response arrives for a skill that has since been
/// re-issued.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResponsePolicy {
    /// Whatever finishes last overwrites the slot, regardless of issue order.
    #[default]
    LastResponseWins,
    /// Re-issuing a skill cancels the older request; late answers are dropped.
    DiscardStale,
}

/// Chat-completion request behaviour.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestConfig {
    /// Optional per-request timeout. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub response_policy: ResponsePolicy,
}

impl RequestConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

// ─────────────────────────────────────────────
// Storage / export
// ─────────────────────────────────────────────

/// Where the session state entry is kept.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Override for the storage file (defaults to `~/.texttuner/storage.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .as_deref()
            .map(utils::expand_home)
            .unwrap_or_else(utils::get_storage_path)
    }
}

/// Where exported result cards are written.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl ExportConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .as_deref()
            .map(utils::expand_home)
            .unwrap_or_else(utils::get_export_path)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
