//! Config loader — reads `~/.texttuner/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.texttuner/config.json`
//! 3. Environment variables `TEXTTUNER_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ResponsePolicy};
use crate::state::Settings;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `TEXTTUNER_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `TEXTTUNER_REQUEST__TIMEOUT_SECS` → `request.timeout_secs`
/// - `TEXTTUNER_REQUEST__RESPONSE_POLICY` → `request.response_policy`
///   (`lastResponseWins` / `discardStale`)
/// - `TEXTTUNER_STORAGE__PATH` → `storage.path`
/// - `TEXTTUNER_EXPORT__DIR` → `export.dir`
fn apply_env_overrides(config: Config) -> Config {
    overrides_from(config, |key| std::env::var(key).ok())
}

fn overrides_from(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = var("TEXTTUNER_REQUEST__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.request.timeout_secs = Some(n);
        }
    }
    if let Some(val) = var("TEXTTUNER_REQUEST__RESPONSE_POLICY") {
        match parse_policy(&val) {
            Some(policy) => config.request.response_policy = policy,
            None => warn!("Ignoring unknown response policy '{}'", val),
        }
    }

    if let Some(val) = var("TEXTTUNER_STORAGE__PATH") {
        config.storage.path = Some(val);
    }
    if let Some(val) = var("TEXTTUNER_EXPORT__DIR") {
        config.export.dir = Some(val);
    }

    config
}

fn parse_policy(val: &str) -> Option<ResponsePolicy> {
    match val.trim().to_ascii_lowercase().as_str() {
        "lastresponsewins" | "last_response_wins" | "last" => Some(ResponsePolicy::LastResponseWins),
        "discardstale" | "discard_stale" | "discard" => Some(ResponsePolicy::DiscardStale),
        _ => None,
    }
}

/// Apply `TEXTTUNER_SETTINGS__*` overrides to restored settings.
///
/// - `TEXTTUNER_SETTINGS__PROVIDER`
/// - `TEXTTUNER_SETTINGS__BASE_URL`
/// - `TEXTTUNER_SETTINGS__MODEL`
/// - `TEXTTUNER_SETTINGS__API_KEY`
///
/// Overrides apply to the in-memory session; the next save writes them
/// like any other setting.
pub fn apply_settings_env(settings: &mut Settings) {
    settings_from(settings, |key| std::env::var(key).ok());
}

fn settings_from(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("TEXTTUNER_SETTINGS__PROVIDER") {
        settings.provider = val;
    }
    if let Some(val) = var("TEXTTUNER_SETTINGS__BASE_URL") {
        settings.base_url = val;
    }
    if let Some(val) = var("TEXTTUNER_SETTINGS__MODEL") {
        settings.model = val;
    }
    if let Some(val) = var("TEXTTUNER_SETTINGS__API_KEY") {
        settings.api_key = val;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.request.response_policy, ResponsePolicy::LastResponseWins);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "request": { "responsePolicy": "discardStale" },
            "export": { "dir": "/tmp/cards" }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.request.response_policy, ResponsePolicy::DiscardStale);
        assert_eq!(config.export.dir.as_deref(), Some("/tmp/cards"));
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert!(config.export.dir.is_none());
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.export.dir = Some("/srv/cards".to_string());

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.export.dir.as_deref(), Some("/srv/cards"));
    }

    #[test]
    fn test_env_override_timeout() {
        let env = vars(&[
            ("TEXTTUNER_REQUEST__TIMEOUT_SECS", "45"),
            ("TEXTTUNER_REQUEST__RESPONSE_POLICY", "discard_stale"),
        ]);
        let config = overrides_from(Config::default(), |k| env.get(k).cloned());
        assert_eq!(config.request.timeout_secs, Some(45));
        assert_eq!(config.request.response_policy, ResponsePolicy::DiscardStale);
    }

    #[test]
    fn test_env_override_bad_values_ignored() {
        let env = vars(&[
            ("TEXTTUNER_REQUEST__TIMEOUT_SECS", "soon"),
            ("TEXTTUNER_REQUEST__RESPONSE_POLICY", "whatever"),
        ]);
        let config = overrides_from(Config::default(), |k| env.get(k).cloned());
        assert_eq!(config.request.timeout_secs, None);
        assert_eq!(config.request.response_policy, ResponsePolicy::LastResponseWins);
    }

    #[test]
    fn test_parse_policy_variants() {
        assert_eq!(parse_policy("discardStale"), Some(ResponsePolicy::DiscardStale));
        assert_eq!(parse_policy("LAST"), Some(ResponsePolicy::LastResponseWins));
        assert_eq!(parse_policy("whatever"), None);
    }

    #[test]
    fn test_settings_env_override_api_key() {
        let env = vars(&[("TEXTTUNER_SETTINGS__API_KEY", "sk-from-env")]);
        let mut settings = Settings {
            model: "kept".into(),
            ..Default::default()
        };
        settings_from(&mut settings, |k| env.get(k).cloned());
        assert_eq!(settings.api_key, "sk-from-env");
        assert_eq!(settings.model, "kept");
    }
}
