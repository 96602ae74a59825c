//! Save / load of the persisted session record.
//!
//! # Record format (single entry under [`STORAGE_KEY`])
//!
//! ```json
//! {
//!   "originalText": "...",
//!   "styleLevel": 0,
//!   "detectedLevel": null,
//!   "settings": { "provider": "google", "baseUrl": "...", "model": "...", "apiKey": "" }
//! }
//! ```
//!
//! Loading never fails. An absent entry is a first run; a malformed entry
//! falls back to defaults; a partially-shaped entry falls back field by field.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::schema::{ProviderDefaults, SessionState, Settings, DEFAULT_PROVIDER};
use super::storage::KeyValueStore;
use crate::error::StorageError;

/// Name of the storage entry holding the session record.
pub const STORAGE_KEY: &str = "textTuner";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedRecord<'a> {
    original_text: &'a str,
    style_level: i32,
    detected_level: Option<i32>,
    settings: &'a Settings,
}

/// Serialize the persisted subset of `state`, replacing any prior entry.
pub fn save_state(store: &dyn KeyValueStore, state: &SessionState) -> Result<(), StorageError> {
    let record = PersistedRecord {
        original_text: &state.original_text,
        style_level: state.style_level,
        detected_level: state.detected_level,
        settings: &state.settings,
    };
    let json = serde_json::to_string(&record)?;
    store.set(STORAGE_KEY, &json)?;
    debug!(
        provider = %state.settings.provider,
        chars = state.original_text.chars().count(),
        "Session state saved"
    );
    Ok(())
}

/// Restore session state. Never fails; see module docs for the fallbacks.
pub fn load_state(store: &dyn KeyValueStore, defaults: &dyn ProviderDefaults) -> SessionState {
    let raw = match store.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("No saved session state, starting fresh");
            return SessionState::with_settings(defaults.default_settings());
        }
        Err(e) => {
            warn!(error = %e, "Failed to read saved session state, using defaults");
            return SessionState::with_settings(defaults.default_settings());
        }
    };

    let value: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Saved session state is not valid JSON, using defaults");
            return SessionState::with_settings(defaults.default_settings());
        }
    };

    if !value.is_object() {
        warn!("Saved session state is not a JSON object, using defaults");
        return SessionState::with_settings(defaults.default_settings());
    }

    state_from_value(&value, defaults)
}

/// Remove the persisted entry (explicit reset).
pub fn clear_state(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(STORAGE_KEY)
}

fn state_from_value(value: &Value, defaults: &dyn ProviderDefaults) -> SessionState {
    let original_text = value
        .get("originalText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let style_level = value.get("styleLevel").and_then(as_i32).unwrap_or(0);

    let detected_level = value.get("detectedLevel").and_then(as_i32);

    let settings = match value.get("settings") {
        Some(Value::Object(_)) => settings_from_value(&value["settings"], defaults),
        Some(_) => {
            warn!("Saved settings are not an object, using defaults");
            defaults.default_settings()
        }
        None => defaults.default_settings(),
    };

    SessionState {
        original_text,
        style_level,
        detected_level,
        settings,
        ..Default::default()
    }
}

fn settings_from_value(value: &Value, defaults: &dyn ProviderDefaults) -> Settings {
    let provider = string_field(value, "provider").unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

    let (default_base, default_model) = defaults.defaults_for(&provider).unwrap_or_default();

    let base_url = string_field(value, "baseUrl").unwrap_or(default_base);
    let model = string_field(value, "model").unwrap_or(default_model);
    let api_key = string_field(value, "apiKey").unwrap_or_default();

    Settings {
        provider,
        base_url,
        model,
        api_key,
    }
}

/// A present string is kept verbatim, even when empty.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

fn as_i32(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|n| i32::try_from(n).ok())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::{FileStore, MemoryStore};
    use serde_json::json;

    struct TestDefaults;

    impl ProviderDefaults for TestDefaults {
        fn defaults_for(&self, provider: &str) -> Option<(String, String)> {
            match provider {
                "google" => Some(("https://google.example/v1".into(), "gemini-2.0-flash".into())),
                "openai" => Some(("https://api.openai.com/v1".into(), "gpt-4".into())),
                "custom" => Some((String::new(), String::new())),
                _ => None,
            }
        }
    }

    fn store_with(value: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store.set(STORAGE_KEY, value).unwrap();
        store
    }

    fn assert_defaults(state: &SessionState) {
        assert_eq!(state.original_text, "");
        assert_eq!(state.style_level, 0);
        assert_eq!(state.detected_level, None);
        assert_eq!(state.settings.provider, "google");
        assert_eq!(state.settings.base_url, "https://google.example/v1");
        assert_eq!(state.settings.model, "gemini-2.0-flash");
        assert_eq!(state.settings.api_key, "");
    }

    #[test]
    fn test_load_absent_gives_defaults() {
        let state = load_state(&MemoryStore::new(), &TestDefaults);
        assert_defaults(&state);
    }

    #[test]
    fn test_load_malformed_gives_defaults() {
        for raw in ["not json", "[1,2]", "42", "null", "\"str\""] {
            let state = load_state(&store_with(raw), &TestDefaults);
            assert_defaults(&state);
        }
    }

    #[test]
    fn test_round_trip_exact() {
        let store = MemoryStore::new();
        let state = SessionState {
            original_text: "hello 世界".into(),
            style_level: -2,
            detected_level: Some(1),
            settings: Settings {
                provider: "custom".into(),
                base_url: "http://localhost:1234/v1".into(),
                model: "local-model".into(),
                api_key: "sk-local".into(),
            },
            ..Default::default()
        };

        save_state(&store, &state).unwrap();
        assert_eq!(load_state(&store, &TestDefaults), state);
    }

    #[test]
    fn test_round_trip_empty_strings_and_null() {
        let store = MemoryStore::new();
        let state = SessionState {
            original_text: String::new(),
            style_level: 0,
            detected_level: None,
            settings: Settings {
                provider: "openai".into(),
                base_url: String::new(),
                model: String::new(),
                api_key: String::new(),
            },
            ..Default::default()
        };

        save_state(&store, &state).unwrap();
        let loaded = load_state(&store, &TestDefaults);
        // Present-but-empty fields are not re-seeded from the registry
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_round_trip_empty_provider() {
        let store = MemoryStore::new();
        let state = SessionState {
            settings: Settings {
                provider: String::new(),
                base_url: String::new(),
                model: "m".into(),
                api_key: "sk".into(),
            },
            ..Default::default()
        };

        save_state(&store, &state).unwrap();
        let loaded = load_state(&store, &TestDefaults);
        assert_eq!(loaded.settings.provider, "");
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_record_shape() {
        let store = MemoryStore::new();
        let mut state = SessionState::default();
        state.original_text = "hi".into();
        state.results.adjust = "not persisted".into();
        save_state(&store, &state).unwrap();

        let raw: Value = serde_json::from_str(&store.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({
                "originalText": "hi",
                "styleLevel": 0,
                "detectedLevel": null,
                "settings": {
                    "provider": "google",
                    "baseUrl": "",
                    "model": "",
                    "apiKey": ""
                }
            })
        );
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let store = store_with(r#"{"originalText":"old","extra":"field"}"#);
        save_state(&store, &SessionState::default()).unwrap();

        let raw: Value = serde_json::from_str(&store.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert!(raw.get("extra").is_none());
        assert_eq!(raw["originalText"], "");
    }

    #[test]
    fn test_load_missing_settings_object() {
        let store = store_with(r#"{"originalText":"kept","styleLevel":1}"#);
        let state = load_state(&store, &TestDefaults);
        assert_eq!(state.original_text, "kept");
        assert_eq!(state.style_level, 1);
        assert_eq!(state.settings.provider, "google");
        assert_eq!(state.settings.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_load_partial_settings_seeded_per_provider() {
        let store = store_with(r#"{"settings":{"provider":"openai","apiKey":"sk-1"}}"#);
        let state = load_state(&store, &TestDefaults);
        assert_eq!(state.settings.provider, "openai");
        assert_eq!(state.settings.base_url, "https://api.openai.com/v1");
        assert_eq!(state.settings.model, "gpt-4");
        assert_eq!(state.settings.api_key, "sk-1");
    }

    #[test]
    fn test_load_settings_without_provider() {
        let store = store_with(r#"{"settings":{"model":"gemini-pro"}}"#);
        let state = load_state(&store, &TestDefaults);
        assert_eq!(state.settings.provider, "google");
        assert_eq!(state.settings.base_url, "https://google.example/v1");
        assert_eq!(state.settings.model, "gemini-pro");
    }

    #[test]
    fn test_load_wrong_types_fall_back_per_field() {
        let store = store_with(
            r#"{
                "originalText": 17,
                "styleLevel": "big",
                "detectedLevel": 2.5,
                "settings": {"provider": "openai", "baseUrl": null, "model": 3, "apiKey": "sk"}
            }"#,
        );
        let state = load_state(&store, &TestDefaults);
        assert_eq!(state.original_text, "");
        assert_eq!(state.style_level, 0);
        assert_eq!(state.detected_level, None);
        assert_eq!(state.settings.base_url, "https://api.openai.com/v1");
        assert_eq!(state.settings.model, "gpt-4");
        assert_eq!(state.settings.api_key, "sk");
    }

    #[test]
    fn test_load_settings_not_object() {
        let store = store_with(r#"{"originalText":"x","settings":"oops"}"#);
        let state = load_state(&store, &TestDefaults);
        assert_eq!(state.original_text, "x");
        assert_eq!(state.settings.provider, "google");
    }

    #[test]
    fn test_load_unknown_provider_keeps_id() {
        let store = store_with(r#"{"settings":{"provider":"mystery"}}"#);
        let state = load_state(&store, &TestDefaults);
        assert_eq!(state.settings.provider, "mystery");
        assert_eq!(state.settings.base_url, "");
    }

    #[test]
    fn test_clear_state() {
        let store = store_with("{}");
        clear_state(&store).unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_store_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "garbage").unwrap();

        let state = load_state(&FileStore::new(&path), &TestDefaults);
        assert_defaults(&state);
    }
}
