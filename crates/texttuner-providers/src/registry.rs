//! Provider registry — the catalogue of known chat-completion backends.
//!
//! Each [`ProviderSpec`] describes how to reach one backend: base URL,
//! default model, and a static list of known models. The `custom`
//! pseudo-provider has no fixed base URL; it is supplied by the user and
//! read from [`Settings`](texttuner_core::Settings) at resolve time.
//!
//! The registry is an immutable value shared via `Arc`. Its only mutable
//! part is an advisory cache of fetched model lists, used for display.

use std::collections::HashMap;
use std::sync::RwLock;

use texttuner_core::state::{ProviderDefaults, CUSTOM_PROVIDER};
use tracing::{debug, warn};

// ─────────────────────────────────────────────
// ProviderSpec
// ─────────────────────────────────────────────

/// Static description of one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSpec {
    /// Unique identifier (e.g. `"openai"`).
    pub id: String,
    /// Human-readable name for display and logs.
    pub display_name: String,
    /// OpenAI-compatible API base, without the `/chat/completions` suffix.
    /// Empty for `custom`.
    pub base_url: String,
    /// Known model identifiers, in display order.
    pub models: Vec<String>,
    /// Model used when the user has not picked one. Empty for `custom`.
    pub default_model: String,
}

impl ProviderSpec {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            base_url: base_url.into(),
            models: Vec::new(),
            default_model: default_model.into(),
        }
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_PROVIDER
    }
}

// ─────────────────────────────────────────────
// ProviderRegistry
// ─────────────────────────────────────────────

/// Lookup table of providers plus the fetched-model cache.
#[derive(Debug)]
pub struct ProviderRegistry {
    specs: Vec<ProviderSpec>,
    fetched_models: RwLock<HashMap<String, Vec<String>>>,
}

impl ProviderRegistry {
    /// Build a registry. Duplicate identifiers keep the first entry.
    pub fn new(specs: impl IntoIterator<Item = ProviderSpec>) -> Self {
        let mut unique: Vec<ProviderSpec> = Vec::new();
        for spec in specs {
            if unique.iter().any(|s| s.id == spec.id) {
                warn!(provider = %spec.id, "Duplicate provider id ignored");
                continue;
            }
            unique.push(spec);
        }
        Self {
            specs: unique,
            fetched_models: RwLock::new(HashMap::new()),
        }
    }

    /// The built-in providers: OpenAI, Google (OpenAI-compatible endpoint), and custom.
    pub fn builtin() -> Self {
        Self::new([
            ProviderSpec::new("openai", "OpenAI", "https://api.openai.com/v1", "gpt-4")
                .with_models(["gpt-4", "gpt-4o", "gpt-4o-mini"]),
            ProviderSpec::new(
                "google",
                "Google",
                "https://generativelanguage.googleapis.com/v1beta/openai",
                "gemini-2.0-flash",
            )
            .with_models(["gemini-2.0-flash", "gemini-1.5-pro"]),
            ProviderSpec::new(CUSTOM_PROVIDER, "自定义", "", ""),
        ])
    }

    /// Find a provider by identifier.
    pub fn get(&self, id: &str) -> Option<&ProviderSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All providers in registration order.
    pub fn specs(&self) -> &[ProviderSpec] {
        &self.specs
    }

    /// Whether `id` is the synthetic user-supplied provider.
    pub fn is_custom(id: &str) -> bool {
        id == CUSTOM_PROVIDER
    }

    /// Remember a fetched model list for display. Advisory only.
    pub fn record_models(&self, id: &str, models: Vec<String>) {
        debug!(provider = id, count = models.len(), "Recording fetched models");
        let mut cache = self.fetched_models.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(id.to_string(), models);
    }

    /// Fetched models if any, otherwise the provider's static list.
    pub fn known_models(&self, id: &str) -> Vec<String> {
        {
            let cache = self.fetched_models.read().unwrap_or_else(|e| e.into_inner());
            if let Some(models) = cache.get(id) {
                return models.clone();
            }
        }
        self.get(id).map(|s| s.models.clone()).unwrap_or_default()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderDefaults for ProviderRegistry {
    fn defaults_for(&self, provider: &str) -> Option<(String, String)> {
        self.get(provider)
            .map(|s| (s.base_url.clone(), s.default_model.clone()))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_providers() {
        let registry = ProviderRegistry::builtin();
        let ids: Vec<&str> = registry.specs().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["openai", "google", "custom"]);
    }

    #[test]
    fn test_get_google() {
        let registry = ProviderRegistry::builtin();
        let spec = registry.get("google").unwrap();
        assert_eq!(spec.display_name, "Google");
        assert_eq!(
            spec.base_url,
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
        assert_eq!(spec.default_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_custom_has_no_fixed_base() {
        let registry = ProviderRegistry::builtin();
        let spec = registry.get("custom").unwrap();
        assert!(spec.is_custom());
        assert!(spec.base_url.is_empty());
        assert!(ProviderRegistry::is_custom("custom"));
        assert!(!ProviderRegistry::is_custom("openai"));
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.get("anthropic").is_none());
        assert!(!registry.contains("anthropic"));
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let registry = ProviderRegistry::new([
            ProviderSpec::new("a", "A", "https://a", "m1"),
            ProviderSpec::new("a", "A again", "https://a2", "m2"),
            ProviderSpec::new("b", "B", "https://b", "m3"),
        ]);
        assert_eq!(registry.specs().len(), 2);
        assert_eq!(registry.get("a").unwrap().base_url, "https://a");
    }

    #[test]
    fn test_known_models_prefers_fetched() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.known_models("openai")[0], "gpt-4");

        registry.record_models("openai", vec!["o1".into(), "o3".into()]);
        assert_eq!(registry.known_models("openai"), vec!["o1", "o3"]);
        // Other providers unaffected
        assert_eq!(registry.known_models("google")[0], "gemini-2.0-flash");
        assert!(registry.known_models("nope").is_empty());
    }

    #[test]
    fn test_provider_defaults_seam() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(
            registry.defaults_for("openai"),
            Some(("https://api.openai.com/v1".to_string(), "gpt-4".to_string()))
        );
        assert!(registry.defaults_for("nope").is_none());

        let settings = registry.default_settings();
        assert_eq!(settings.provider, "google");
        assert_eq!(settings.model, "gemini-2.0-flash");
        assert!(settings.api_key.is_empty());
    }
}
