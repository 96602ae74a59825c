//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! A plain line replaces the original text; `:`-commands run skills and
//! change settings.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use texttuner_core::config::Config;
use texttuner_core::state::ResultSlot;
use texttuner_providers::SettingsUpdate;
use texttuner_skills::{level_label, MarkdownCardExporter, Skill, SkillOutcome, Studio};

use crate::{helpers, interruptible, settings_cmd};

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", ":exit", ":quit", ":q"];

const HELP: &str = "\
  <text>              set the original text
  :paste              multi-line input, end with a single '.'
  :adjust [LEVEL]     rewrite at LEVEL (-2..2, default: current level)
  :level LEVEL        set the adjust level
  :detect             detect the style level, then critique it
  :critique [LEVEL]   critique at LEVEL (default: detected level)
  :truth  :hidden  :summary  :continue  :expand
  :imitate TOPIC      write about TOPIC in the text's style
  :models             list the provider's models
  :provider ID  :model ID  :key KEY
  :base URL           set the base URL (custom provider only)
  :show               settings and session
  :export [SKILL]     export a result card (default: adjust)
  :reset              clear text and results
  exit                quit";

/// One parsed REPL line.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Text(String),
    Paste,
    Adjust(Option<i32>),
    Level(i32),
    Detect,
    Critique(Option<i32>),
    Run(Skill),
    Imitate(String),
    Models,
    Settings(SettingsUpdate),
    Show,
    Export(ResultSlot),
    Reset,
    Help,
    Exit,
    Invalid(String),
}

fn parse_level_arg(arg: &str) -> Result<Option<i32>, String> {
    if arg.is_empty() {
        return Ok(None);
    }
    arg.parse()
        .map(Some)
        .map_err(|_| format!("无效的等级: {arg}"))
}

/// Parse one non-empty, trimmed line.
fn parse_line(line: &str) -> ReplCommand {
    if is_exit_command(line) {
        return ReplCommand::Exit;
    }
    let Some(command) = line.strip_prefix(':') else {
        return ReplCommand::Text(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let setting = |update: SettingsUpdate| {
        if arg.is_empty() {
            ReplCommand::Invalid(format!(":{name} 需要一个参数"))
        } else {
            ReplCommand::Settings(update)
        }
    };

    match name {
        "paste" => ReplCommand::Paste,
        "adjust" => match parse_level_arg(arg) {
            Ok(level) => ReplCommand::Adjust(level),
            Err(e) => ReplCommand::Invalid(e),
        },
        "level" => match parse_level_arg(arg) {
            Ok(Some(level)) => ReplCommand::Level(level),
            Ok(None) => ReplCommand::Invalid(":level 需要一个等级".into()),
            Err(e) => ReplCommand::Invalid(e),
        },
        "detect" => ReplCommand::Detect,
        "critique" => match parse_level_arg(arg) {
            Ok(level) => ReplCommand::Critique(level),
            Err(e) => ReplCommand::Invalid(e),
        },
        "imitate" => ReplCommand::Imitate(arg.to_string()),
        "models" => ReplCommand::Models,
        "provider" => setting(SettingsUpdate {
            provider: Some(arg.to_string()),
            ..Default::default()
        }),
        "model" => setting(SettingsUpdate {
            model: Some(arg.to_string()),
            ..Default::default()
        }),
        "key" => setting(SettingsUpdate {
            api_key: Some(arg.to_string()),
            ..Default::default()
        }),
        "base" => setting(SettingsUpdate {
            base_url: Some(arg.to_string()),
            ..Default::default()
        }),
        "show" => ReplCommand::Show,
        "export" => {
            let skill = if arg.is_empty() { Some(Skill::Adjust) } else { Skill::from_name(arg) };
            match skill.and_then(Skill::slot) {
                Some(slot) => ReplCommand::Export(slot),
                None => ReplCommand::Invalid(format!("无法导出: {arg}")),
            }
        }
        "reset" => ReplCommand::Reset,
        "help" | "h" | "?" => ReplCommand::Help,
        other => match Skill::from_name(other) {
            Some(skill @ (Skill::TruthAnalysis
            | Skill::HiddenMeaning
            | Skill::StyleSummary
            | Skill::Continuation
            | Skill::Expansion)) => ReplCommand::Run(skill),
            _ => ReplCommand::Invalid(format!("未知命令 :{other}，输入 :help 查看帮助")),
        },
    }
}

/// Print an outcome without ending the session.
fn show(skill: Skill, outcome: &SkillOutcome) {
    match outcome {
        SkillOutcome::Completed(text) => helpers::print_result(skill.title(), text),
        other => {
            if let Some(msg) = helpers::failure_text(other) {
                helpers::print_failure(&msg);
            }
        }
    }
}

/// Run the interactive REPL loop.
pub async fn run(studio: Studio, config: &Config) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("TextTuner> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let _ = editor.add_history_entry(&input);
        debug!(input = trimmed, "processing input");

        match parse_line(trimmed) {
            ReplCommand::Exit => {
                println!("\nBye!");
                break;
            }
            ReplCommand::Text(text) => set_text(&studio, text),
            ReplCommand::Paste => {
                let text = read_paste(&mut editor)?;
                set_text(&studio, text);
            }
            ReplCommand::Adjust(level) => {
                if let Some(level) = level {
                    if let Err(e) = studio.set_style_level(level) {
                        helpers::print_failure(&helpers::rejection(e).to_string());
                        continue;
                    }
                }
                let outcome = interruptible(&studio, studio.generate_text()).await;
                show(Skill::Adjust, &outcome);
            }
            ReplCommand::Level(level) => match studio.set_style_level(level) {
                Ok(()) => helpers::print_notice(&format!("等级已设为 {}", level_label(level))),
                Err(e) => helpers::print_failure(&helpers::rejection(e).to_string()),
            },
            ReplCommand::Detect => {
                let report = interruptible(&studio, studio.detect_and_critique()).await;
                match &report.detection {
                    SkillOutcome::Completed(detection) => helpers::print_detection(detection),
                    other => {
                        if let Some(msg) = helpers::failure_text(other) {
                            helpers::print_failure(&msg);
                        }
                    }
                }
                if let Some(critique) = &report.critique {
                    show(Skill::Critique, critique);
                }
            }
            ReplCommand::Critique(level) => {
                match level.or(studio.snapshot().detected_level) {
                    Some(level) => {
                        let outcome = interruptible(&studio, studio.critique(level)).await;
                        show(Skill::Critique, &outcome);
                    }
                    None => helpers::print_failure("尚未检测包装等级，请先运行 :detect 或指定等级"),
                }
            }
            ReplCommand::Run(skill) => {
                let outcome = match skill {
                    Skill::TruthAnalysis => interruptible(&studio, studio.truth_analysis()).await,
                    Skill::HiddenMeaning => interruptible(&studio, studio.hidden_meaning()).await,
                    Skill::StyleSummary => interruptible(&studio, studio.style_summary()).await,
                    Skill::Continuation => interruptible(&studio, studio.continuation()).await,
                    _ => interruptible(&studio, studio.expansion()).await,
                };
                show(skill, &outcome);
            }
            ReplCommand::Imitate(topic) => {
                let outcome = interruptible(&studio, studio.imitate(&topic)).await;
                show(Skill::Imitation, &outcome);
            }
            ReplCommand::Models => {
                let outcome = interruptible(&studio, studio.fetch_models()).await;
                if let Err(e) = helpers::print_models(&studio, outcome) {
                    helpers::print_failure(&e.to_string());
                }
            }
            ReplCommand::Settings(update) => match studio.update_settings(&update) {
                Ok(_) => settings_cmd::print_settings(&studio),
                Err(e) => helpers::print_failure(&helpers::rejection(e).to_string()),
            },
            ReplCommand::Show => {
                settings_cmd::print_settings(&studio);
                print_session(&studio);
            }
            ReplCommand::Export(slot) => {
                let exporter = MarkdownCardExporter::new(config.export.resolved_dir());
                if let Err(e) = helpers::report_export(&studio.export(slot, &exporter)) {
                    helpers::print_failure(&e.to_string());
                }
            }
            ReplCommand::Reset => {
                studio.reset();
                helpers::print_notice("已重置");
            }
            ReplCommand::Help => println!("\n{HELP}\n"),
            ReplCommand::Invalid(msg) => helpers::print_failure(&msg),
        }
    }

    // Save history
    save_history(&mut editor);

    Ok(())
}

fn set_text(studio: &Studio, text: String) {
    let chars = text.chars().count();
    studio.set_original_text(text);
    helpers::print_notice(&format!("原始文案已更新 ({chars} 字)"));
}

/// Read lines until a lone `.`; Ctrl-C/Ctrl-D also end the paste.
fn read_paste(editor: &mut Editor<(), DefaultHistory>) -> Result<String> {
    let mut lines = Vec::new();
    loop {
        match editor.readline("... ") {
            Ok(line) if line.trim() == "." => break,
            Ok(line) => lines.push(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(lines.join("\n"))
}

fn print_session(studio: &Studio) {
    let state = studio.snapshot();
    println!("  {:<12} {}", "Text:", state.original_text);
    println!("  {:<12} {}", "Level:", level_label(state.style_level));
    if let Some(level) = state.detected_level {
        println!("  {:<12} {}", "Detected:", level_label(level));
    }
    for slot in ResultSlot::ALL {
        let text = state.results.get(slot);
        if !text.is_empty() {
            println!("  {:<12} {} chars", Skill::for_slot(slot).title(), text.chars().count());
        }
    }
    println!();
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    // Load history from ~/.texttuner/history/repl_history
    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    texttuner_core::utils::get_data_path()
        .join("history")
        .join("repl_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
