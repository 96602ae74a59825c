//! Settings store operations — resolving the effective endpoint and
//! applying user updates.
//!
//! Loading and saving the settings are handled by the persistence layer
//! in `texttuner-core`; this module only interprets them against the
//! registry.

use texttuner_core::error::ValidationError;
use texttuner_core::utils::mask_secret;
use texttuner_core::Settings;

use crate::registry::ProviderRegistry;

/// The concrete endpoint, model, and credential for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    /// Provider identifier, for logging.
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

/// Resolve settings into an endpoint.
///
/// `custom` takes its base URL from settings; every other provider takes it
/// from the registry. Model and key always come from settings.
pub fn resolve(
    settings: &Settings,
    registry: &ProviderRegistry,
) -> Result<ResolvedProvider, ValidationError> {
    let base_url = if ProviderRegistry::is_custom(&settings.provider) {
        if settings.base_url.trim().is_empty() {
            return Err(ValidationError::MissingBaseUrl);
        }
        settings.base_url.clone()
    } else {
        registry
            .get(&settings.provider)
            .ok_or_else(|| ValidationError::UnknownProvider(settings.provider.clone()))?
            .base_url
            .clone()
    };

    Ok(ResolvedProvider {
        provider: settings.provider.clone(),
        base_url,
        model: settings.model.clone(),
        api_key: settings.api_key.clone(),
    })
}

/// Switch to provider `id`, reseeding base URL and model from its registry
/// entry. Selecting the current provider again keeps the user's overrides.
pub fn select_provider(
    settings: &mut Settings,
    registry: &ProviderRegistry,
    id: &str,
) -> Result<(), ValidationError> {
    let spec = registry
        .get(id)
        .ok_or_else(|| ValidationError::UnknownProvider(id.to_string()))?;

    if settings.provider == id {
        return Ok(());
    }

    settings.provider = spec.id.clone();
    settings.base_url = spec.base_url.clone();
    settings.model = spec.default_model.clone();
    Ok(())
}

/// A user-initiated settings change. `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.base_url.is_none()
            && self.model.is_none()
            && self.api_key.is_none()
    }

    /// Provider selection first, then explicit field overrides.
    /// A base URL is only accepted for `custom`.
    /// On error `settings` is left untouched.
    pub fn apply(
        &self,
        settings: &mut Settings,
        registry: &ProviderRegistry,
    ) -> Result<(), ValidationError> {
        let mut next = settings.clone();

        if let Some(provider) = &self.provider {
            select_provider(&mut next, registry, provider.trim())?;
        }
        if let Some(base_url) = &self.base_url {
            if !ProviderRegistry::is_custom(&next.provider) {
                return Err(ValidationError::FixedBaseUrl(next.provider));
            }
            next.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = &self.model {
            next.model = model.trim().to_string();
        }
        if let Some(api_key) = &self.api_key {
            next.api_key = api_key.trim().to_string();
        }

        *settings = next;
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use texttuner_core::ProviderDefaults;

    fn seeded(registry: &ProviderRegistry, provider: &str) -> Settings {
        let mut settings = registry.default_settings();
        select_provider(&mut settings, registry, provider).unwrap();
        settings
    }

    #[test]
    fn test_resolve_non_custom_uses_registry() {
        let registry = ProviderRegistry::builtin();
        for spec in registry.specs().iter().filter(|s| !s.is_custom()) {
            let settings = seeded(&registry, &spec.id);
            let resolved = resolve(&settings, &registry).unwrap();
            assert_eq!(resolved.base_url, spec.base_url, "{}", spec.id);
            assert_eq!(resolved.model, spec.default_model, "{}", spec.id);
        }
    }

    #[test]
    fn test_resolve_ignores_settings_base_for_registry_provider() {
        let registry = ProviderRegistry::builtin();
        let mut settings = seeded(&registry, "openai");
        settings.base_url = "https://somewhere.else/v1".into();

        let resolved = resolve(&settings, &registry).unwrap();
        assert_eq!(resolved.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_resolve_custom_uses_settings_base() {
        let registry = ProviderRegistry::builtin();
        let settings = Settings {
            provider: "custom".into(),
            base_url: "http://localhost:11434/v1".into(),
            model: "llama3".into(),
            api_key: "ollama".into(),
        };

        let resolved = resolve(&settings, &registry).unwrap();
        assert_eq!(resolved.base_url, "http://localhost:11434/v1");
        assert_eq!(resolved.model, "llama3");
        assert_eq!(resolved.api_key, "ollama");
    }

    #[test]
    fn test_resolve_custom_without_base() {
        let registry = ProviderRegistry::builtin();
        let settings = Settings {
            provider: "custom".into(),
            ..Default::default()
        };
        assert_eq!(
            resolve(&settings, &registry),
            Err(ValidationError::MissingBaseUrl)
        );
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let registry = ProviderRegistry::builtin();
        let settings = Settings {
            provider: "mystery".into(),
            ..Default::default()
        };
        assert_eq!(
            resolve(&settings, &registry),
            Err(ValidationError::UnknownProvider("mystery".into()))
        );
    }

    #[test]
    fn test_select_provider_reseeds_and_keeps_key() {
        let registry = ProviderRegistry::builtin();
        let mut settings = registry.default_settings();
        settings.api_key = "sk-keep".into();

        select_provider(&mut settings, &registry, "openai").unwrap();
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.model, "gpt-4");
        assert_eq!(settings.api_key, "sk-keep");
    }

    #[test]
    fn test_select_same_provider_keeps_overrides() {
        let registry = ProviderRegistry::builtin();
        let mut settings = registry.default_settings();
        settings.model = "gemini-1.5-pro".into();

        select_provider(&mut settings, &registry, "google").unwrap();
        assert_eq!(settings.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_update_custom_with_overrides() {
        let registry = ProviderRegistry::builtin();
        let mut settings = registry.default_settings();

        let update = SettingsUpdate {
            provider: Some("custom".into()),
            base_url: Some(" http://localhost:8000/v1/ ".into()),
            model: Some("qwen2".into()),
            api_key: Some("sk-x".into()),
        };
        update.apply(&mut settings, &registry).unwrap();

        assert_eq!(settings.provider, "custom");
        assert_eq!(settings.base_url, "http://localhost:8000/v1");
        assert_eq!(settings.model, "qwen2");
        assert_eq!(settings.api_key, "sk-x");
    }

    #[test]
    fn test_update_unknown_provider_leaves_settings() {
        let registry = ProviderRegistry::builtin();
        let mut settings = registry.default_settings();
        let before = settings.clone();

        let update = SettingsUpdate {
            provider: Some("nope".into()),
            api_key: Some("sk".into()),
            ..Default::default()
        };
        assert!(update.apply(&mut settings, &registry).is_err());
        assert_eq!(settings, before);
    }

    #[test]
    fn test_update_base_url_requires_custom() {
        let registry = ProviderRegistry::builtin();
        let mut settings = seeded(&registry, "openai");
        let before = settings.clone();

        let update = SettingsUpdate {
            base_url: Some("https://proxy.example/v1".into()),
            model: Some("gpt-4o".into()),
            ..Default::default()
        };
        assert_eq!(
            update.apply(&mut settings, &registry),
            Err(ValidationError::FixedBaseUrl("openai".into()))
        );
        assert_eq!(settings, before);

        // Switching to custom in the same update makes the base URL editable.
        let update = SettingsUpdate {
            provider: Some("custom".into()),
            base_url: Some("https://proxy.example/v1".into()),
            ..Default::default()
        };
        update.apply(&mut settings, &registry).unwrap();
        assert_eq!(settings.base_url, "https://proxy.example/v1");
    }

    #[test]
    fn test_resolved_debug_masks_key() {
        let resolved = ResolvedProvider {
            provider: "openai".into(),
            base_url: "u".into(),
            model: "m".into(),
            api_key: "sk-very-secret".into(),
        };
        assert!(!format!("{resolved:?}").contains("very-secret"));
    }
}
