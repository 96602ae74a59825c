//! `texttuner onboard` — initialize configuration and data directories.
//!
//! - Creates `~/.texttuner/config.json` with defaults
//! - Creates the data, history, and export directories

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use texttuner_core::config::{get_config_path, load_config, save_config};
use texttuner_core::utils::get_data_path;

/// Run the onboard command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "TextTuner Setup".cyan().bold());
    println!();

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    // 1. Create config if it doesn't exist
    if ensure_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    // 2. Data, history, and export directories
    let config = load_config(Some(&config_path));
    let data_dir = get_data_path();
    for (label, dir) in [
        ("data dir", data_dir.clone()),
        ("history dir", data_dir.join("history")),
        ("export dir", config.export.resolved_dir()),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {label}: {}", dir.display()))?;
        println!("  {} {label} at {}", "✓".green(), dir.display());
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Next: `texttuner settings --provider openai --api-key <KEY>`".green()
    );
    println!();

    Ok(())
}

/// Write a default config if none exists. Returns whether one was created.
fn ensure_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let config = load_config(Some(path));
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_config_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(ensure_config(&path).unwrap());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"request\""));
    }

    #[test]
    fn ensure_config_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{\"request\":{\"timeoutSecs\":5}}").unwrap();

        assert!(!ensure_config(&path).unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"request\":{\"timeoutSecs\":5}}"
        );
    }
}
