//! TextTuner CLI — entry point.
//!
//! # Commands
//!
//! - `texttuner adjust [-l LEVEL] [TEXT]` — rewrite at a style level (-2..=2)
//! - `texttuner detect [TEXT]` — detect the style level, then critique it
//! - `texttuner critique|truth|hidden|summary|continue|expand [TEXT]`
//! - `texttuner imitate TOPIC [TEXT]` — write about TOPIC in the text's style
//! - `texttuner models` — list the provider's models
//! - `texttuner settings [--provider ..] [--model ..] [--api-key ..]`
//! - `texttuner status` / `onboard` / `reset` / `repl`
//!
//! TEXT defaults to the saved original text; `-` reads it from stdin.

mod helpers;
mod onboard;
mod repl;
mod settings_cmd;
mod status;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use texttuner_core::config::{load_config, Config};
use texttuner_core::config::loader::apply_settings_env;
use texttuner_core::state::{load_state, FileStore, KeyValueStore};
use texttuner_providers::{HttpBackend, Orchestrator, ProviderRegistry};
use texttuner_skills::{MarkdownCardExporter, Skill, SkillOutcome, Studio};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// TextTuner: dial the ostentation of any text up or down
#[derive(Parser)]
#[command(name = "texttuner", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    /// Config file (default: ~/.texttuner/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct TextArgs {
    /// Original text. Omit to reuse the saved text; "-" reads stdin.
    text: Option<String>,

    /// Also export the result as a Markdown card
    #[arg(long, default_value_t = false)]
    export: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the text at a style level
    Adjust {
        /// Target level, -2 (plain) to 2 (maximum jargon)
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i32>,

        #[command(flatten)]
        input: TextArgs,
    },

    /// Detect the text's style level and critique it
    Detect {
        /// Skip the follow-up critique
        #[arg(long, default_value_t = false)]
        no_critique: bool,

        #[command(flatten)]
        input: TextArgs,
    },

    /// Critique the text at a level (default: last detected level)
    Critique {
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i32>,

        #[command(flatten)]
        input: TextArgs,
    },

    /// Say what the text actually means
    Truth {
        #[command(flatten)]
        input: TextArgs,
    },

    /// Read between the lines
    Hidden {
        #[command(flatten)]
        input: TextArgs,
    },

    /// Summarize the writing style
    Summary {
        #[command(flatten)]
        input: TextArgs,
    },

    /// Write about a new topic in the text's style
    Imitate {
        /// Topic for the new text
        topic: String,

        #[command(flatten)]
        input: TextArgs,
    },

    /// Continue the text in the same style
    Continue {
        #[command(flatten)]
        input: TextArgs,
    },

    /// Expand the text in the same style
    Expand {
        #[command(flatten)]
        input: TextArgs,
    },

    /// List models offered by the configured provider
    Models,

    /// Show or change provider settings
    Settings(settings_cmd::SettingsArgs),

    /// Show configuration and session status
    Status,

    /// Initialize configuration and data directories
    Onboard,

    /// Clear the saved session (add --all to also forget settings)
    Reset {
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Interactive session
    Repl,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Onboard => onboard::run(cli.config.as_deref()),
        Commands::Status => status::run(&config, cli.config.as_deref()),
        Commands::Settings(args) => settings_cmd::run(&build_studio(&config)?, args),
        Commands::Models => {
            let studio = build_studio(&config)?;
            let outcome = interruptible(&studio, studio.fetch_models()).await;
            helpers::print_models(&studio, outcome)
        }
        Commands::Reset { all } => {
            let studio = build_studio(&config)?;
            if all {
                studio.reset_all().context("failed to clear saved state")?;
            } else {
                studio.reset();
            }
            helpers::print_notice("已重置");
            Ok(())
        }
        Commands::Repl => repl::run(build_studio(&config)?, &config).await,
        command => run_skill_command(&config, command).await,
    }
}

// ─────────────────────────────────────────────
// Skill commands
// ─────────────────────────────────────────────

async fn run_skill_command(config: &Config, command: Commands) -> Result<()> {
    let studio = build_studio(config)?;

    let (skill, input, outcome) = match command {
        Commands::Adjust { level, input } => {
            apply_input(&studio, &input)?;
            if let Some(level) = level {
                studio.set_style_level(level).map_err(helpers::rejection)?;
            }
            let outcome = interruptible(&studio, studio.generate_text()).await;
            (Skill::Adjust, input, outcome)
        }
        Commands::Detect { no_critique, input } => {
            apply_input(&studio, &input)?;
            return run_detect(&studio, config, no_critique, input.export).await;
        }
        Commands::Critique { level, input } => {
            apply_input(&studio, &input)?;
            let Some(level) = level.or(studio.snapshot().detected_level) else {
                bail!("尚未检测包装等级，请先运行 `texttuner detect` 或使用 --level 指定");
            };
            let outcome = interruptible(&studio, studio.critique(level)).await;
            (Skill::Critique, input, outcome)
        }
        Commands::Truth { input } => {
            apply_input(&studio, &input)?;
            let outcome = interruptible(&studio, studio.truth_analysis()).await;
            (Skill::TruthAnalysis, input, outcome)
        }
        Commands::Hidden { input } => {
            apply_input(&studio, &input)?;
            let outcome = interruptible(&studio, studio.hidden_meaning()).await;
            (Skill::HiddenMeaning, input, outcome)
        }
        Commands::Summary { input } => {
            apply_input(&studio, &input)?;
            let outcome = interruptible(&studio, studio.style_summary()).await;
            (Skill::StyleSummary, input, outcome)
        }
        Commands::Imitate { topic, input } => {
            apply_input(&studio, &input)?;
            info!(topic = %topic, "Running imitation");
            let outcome = interruptible(&studio, studio.imitate(&topic)).await;
            (Skill::Imitation, input, outcome)
        }
        Commands::Continue { input } => {
            apply_input(&studio, &input)?;
            let outcome = interruptible(&studio, studio.continuation()).await;
            (Skill::Continuation, input, outcome)
        }
        Commands::Expand { input } => {
            apply_input(&studio, &input)?;
            let outcome = interruptible(&studio, studio.expansion()).await;
            (Skill::Expansion, input, outcome)
        }
        _ => unreachable!("non-skill commands are dispatched in main"),
    };

    finish(&studio, config, skill, outcome, input.export)
}

async fn run_detect(studio: &Studio, config: &Config, no_critique: bool, export: bool) -> Result<()> {
    if no_critique {
        let outcome = interruptible(studio, studio.detect_style()).await;
        return helpers::report_detection(&outcome);
    }

    let report = interruptible(studio, studio.detect_and_critique()).await;
    helpers::report_detection(&report.detection)?;
    match report.critique {
        Some(outcome) => finish(studio, config, Skill::Critique, outcome, export),
        None => Ok(()),
    }
}

fn finish(
    studio: &Studio,
    config: &Config,
    skill: Skill,
    outcome: SkillOutcome,
    export: bool,
) -> Result<()> {
    helpers::report(skill, &outcome)?;
    if export {
        if let Some(slot) = skill.slot() {
            let exporter = MarkdownCardExporter::new(config.export.resolved_dir());
            helpers::report_export(&studio.export(slot, &exporter))?;
        }
    }
    Ok(())
}

/// Replace the original text if one was given on the command line.
fn apply_input(studio: &Studio, input: &TextArgs) -> Result<()> {
    match input.text.as_deref() {
        Some("-") => {
            let text = std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?;
            studio.set_original_text(text);
        }
        Some(text) => studio.set_original_text(text),
        None => {}
    }
    Ok(())
}

/// Run a skill future; Ctrl-C cancels every in-flight request.
pub async fn interruptible<T>(studio: &Studio, fut: impl Future<Output = T>) -> T {
    tokio::pin!(fut);
    helpers::print_thinking();
    let out = tokio::select! {
        out = &mut fut => out,
        _ = tokio::signal::ctrl_c() => {
            studio.cancel_all();
            fut.await
        }
    };
    helpers::clear_thinking();
    out
}

// ─────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────

/// Build a `Studio` from the loaded configuration.
pub fn build_studio(config: &Config) -> Result<Studio> {
    let registry = Arc::new(ProviderRegistry::builtin());

    let storage_path = config.storage.resolved_path();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&storage_path));

    let backend = HttpBackend::new().context("failed to create HTTP client")?;
    let orchestrator = Orchestrator::new(Arc::new(backend)).with_timeout(config.request.timeout());

    let mut state = load_state(store.as_ref(), &*registry);
    apply_settings_env(&mut state.settings);

    info!(
        storage = %storage_path.display(),
        provider = %state.settings.provider,
        policy = ?config.request.response_policy,
        "Studio ready"
    );

    Ok(Studio::new(registry, orchestrator, store, state).with_policy(config.request.response_policy))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("texttuner=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
