//! `texttuner status` — show configuration, settings, and session status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use texttuner_core::config::loader::apply_settings_env;
use texttuner_core::config::{get_config_path, Config};
use texttuner_core::state::{load_state, FileStore};
use texttuner_core::utils::mask_secret;
use texttuner_providers::{resolve, ProviderRegistry};
use texttuner_skills::level_label;

fn presence(path: &Path) -> String {
    if path.exists() {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}

/// Run the status command.
pub fn run(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);
    let storage_path = config.storage.resolved_path();
    let export_dir = config.export.resolved_dir();

    let registry = ProviderRegistry::builtin();
    let mut state = load_state(&FileStore::new(&storage_path), &registry);
    apply_settings_env(&mut state.settings);
    let settings = &state.settings;

    println!();
    println!("{}", "TextTuner Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        presence(&config_path)
    );
    println!(
        "  {:<18} {} {}",
        "Storage:".bold(),
        storage_path.display(),
        presence(&storage_path)
    );
    println!("  {:<18} {}", "Exports:".bold(), export_dir.display());

    let timeout = match config.request.timeout() {
        Some(t) => format!("{}s", t.as_secs()),
        None => "none".into(),
    };
    println!(
        "  {:<18} {} | policy: {}",
        "Requests:".bold(),
        format!("timeout: {timeout}").dimmed(),
        format!("{:?}", config.request.response_policy).dimmed(),
    );

    // Provider
    println!();
    println!("  {}", "Provider:".bold());
    for spec in registry.specs() {
        let marker = if spec.id == settings.provider {
            "●".green().to_string()
        } else {
            "·".dimmed().to_string()
        };
        println!("    {marker} {:<10} {}", spec.id, spec.display_name.dimmed());
    }
    let endpoint = match resolve(settings, &registry) {
        Ok(resolved) => resolved.base_url,
        Err(e) => format!("{}", e.to_string().red()),
    };
    println!("    {:<12} {}", "Endpoint:", endpoint);
    println!("    {:<12} {}", "Model:", settings.model);
    let key = if settings.has_api_key() {
        format!("{} ({})", "✓".green(), mask_secret(&settings.api_key))
    } else {
        format!("{}", "· not configured".dimmed())
    };
    println!("    {:<12} {}", "API key:", key);

    // Session
    println!();
    println!("  {}", "Session:".bold());
    println!(
        "    {:<12} {} chars",
        "Text:",
        state.original_text.chars().count()
    );
    println!("    {:<12} {}", "Level:", state.style_level);
    let detected = match state.detected_level {
        Some(level) => level_label(level),
        None => "-".into(),
    };
    println!("    {:<12} {}", "Detected:", detected);

    println!();

    Ok(())
}
