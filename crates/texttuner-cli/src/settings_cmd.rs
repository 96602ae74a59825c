//! `texttuner settings` — show or change provider settings.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use texttuner_core::utils::mask_secret;
use texttuner_providers::SettingsUpdate;
use texttuner_skills::Studio;

use crate::helpers;

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Provider id: openai, google, or custom
    #[arg(long)]
    pub provider: Option<String>,

    /// API base URL (custom provider)
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub api_key: Option<String>,
}

impl SettingsArgs {
    pub fn into_update(self) -> SettingsUpdate {
        SettingsUpdate {
            provider: self.provider,
            base_url: self.base_url,
            model: self.model,
            api_key: self.api_key,
        }
    }
}

/// Apply any given flags, then print the effective settings.
pub fn run(studio: &Studio, args: SettingsArgs) -> Result<()> {
    let update = args.into_update();
    if !update.is_empty() {
        studio.update_settings(&update).map_err(helpers::rejection)?;
        helpers::print_notice("设置已保存");
    }
    print_settings(studio);
    Ok(())
}

pub fn print_settings(studio: &Studio) {
    let settings = studio.settings();
    let registry = studio.registry();
    let display = registry
        .get(&settings.provider)
        .map(|s| s.display_name.as_str())
        .unwrap_or("?");

    let key = if settings.has_api_key() {
        mask_secret(&settings.api_key).green().to_string()
    } else {
        "(not set)".red().to_string()
    };

    println!();
    println!("  {:<12} {} ({})", "Provider:".bold(), settings.provider, display);
    println!("  {:<12} {}", "Base URL:".bold(), settings.base_url);
    println!("  {:<12} {}", "Model:".bold(), settings.model);
    println!("  {:<12} {}", "API key:".bold(), key);

    let models = registry.known_models(&settings.provider);
    if !models.is_empty() {
        println!("  {:<12} {}", "Known:".bold(), models.join(", ").dimmed());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use texttuner_core::state::{MemoryStore, SessionState};
    use texttuner_providers::{HttpBackend, Orchestrator, ProviderRegistry};

    fn studio() -> Studio {
        Studio::new(
            Arc::new(ProviderRegistry::builtin()),
            Orchestrator::new(Arc::new(HttpBackend::new().unwrap())),
            Arc::new(MemoryStore::new()),
            SessionState::default(),
        )
    }

    #[test]
    fn into_update_maps_flags() {
        let update = SettingsArgs {
            model: Some("gpt-4o".into()),
            ..Default::default()
        }
        .into_update();
        assert_eq!(update.model.as_deref(), Some("gpt-4o"));
        assert!(update.provider.is_none());
        assert!(SettingsArgs::default().into_update().is_empty());
    }

    #[test]
    fn run_applies_update() {
        let studio = studio();
        run(
            &studio,
            SettingsArgs {
                provider: Some("openai".into()),
                api_key: Some("sk-cli".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let settings = studio.settings();
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.model, "gpt-4");
        assert_eq!(settings.api_key, "sk-cli");
    }

    #[test]
    fn run_rejects_unknown_provider() {
        let studio = studio();
        let err = run(
            &studio,
            SettingsArgs {
                provider: Some("azure".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("azure"));
    }
}
