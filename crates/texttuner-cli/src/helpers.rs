//! Shared CLI helpers — outcome rendering, busy indicator, version banner.

use anyhow::{anyhow, Result};
use colored::Colorize;

use texttuner_core::error::ValidationError;
use texttuner_skills::skill::rejection_message;
use texttuner_skills::{Detection, ExportArtifact, Skill, SkillOutcome, Studio};

/// Turn a validation failure into the CLI's error type.
pub fn rejection(error: ValidationError) -> anyhow::Error {
    anyhow!(rejection_message(&error))
}

/// User-facing message for anything but `Completed`.
pub fn failure_text<T>(outcome: &SkillOutcome<T>) -> Option<String> {
    match outcome {
        SkillOutcome::Completed(_) => None,
        SkillOutcome::Rejected(e) => Some(rejection_message(e)),
        SkillOutcome::Failed(msg) => Some(msg.clone()),
        SkillOutcome::Cancelled => Some("已取消".into()),
    }
}

fn into_result<T>(outcome: &SkillOutcome<T>) -> Result<()> {
    match failure_text(outcome) {
        Some(msg) => Err(anyhow!(msg)),
        None => Ok(()),
    }
}

/// Print a skill result under its heading.
pub fn print_result(title: &str, text: &str) {
    println!();
    println!("{}", title.cyan().bold());
    if text.is_empty() {
        println!("{}", "(empty)".dimmed());
    } else {
        println!("{text}");
    }
    println!();
}

pub fn print_detection(detection: &Detection) {
    println!();
    println!(
        "{} {}",
        Skill::Detect.title().cyan().bold(),
        detection.label.yellow().bold()
    );
}

pub fn print_failure(message: &str) {
    eprintln!("\n{} {message}\n", "❌".red());
}

pub fn print_notice(message: &str) {
    println!("{} {message}", "✓".green());
}

/// Print a completed outcome; anything else becomes an error.
pub fn report(skill: Skill, outcome: &SkillOutcome) -> Result<()> {
    if let SkillOutcome::Completed(text) = outcome {
        print_result(skill.title(), text);
    }
    into_result(outcome)
}

pub fn report_detection(outcome: &SkillOutcome<Detection>) -> Result<()> {
    if let SkillOutcome::Completed(detection) = outcome {
        print_detection(detection);
    }
    into_result(outcome)
}

pub fn report_export(outcome: &SkillOutcome<ExportArtifact>) -> Result<()> {
    if let SkillOutcome::Completed(artifact) = outcome {
        print_notice(&format!("已导出 {}", artifact.path.display()));
    }
    into_result(outcome)
}

/// List fetched models, marking the configured one.
pub fn print_models(studio: &Studio, outcome: SkillOutcome<Vec<String>>) -> Result<()> {
    into_result(&outcome)?;
    let current = studio.settings().model;
    let models = outcome.completed().cloned().unwrap_or_default();

    println!();
    if models.is_empty() {
        println!("{}", "(no models)".dimmed());
    }
    for model in &models {
        if *model == current {
            println!("  {} {}", "*".green(), model.bold());
        } else {
            println!("    {model}");
        }
    }
    println!();
    Ok(())
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "TextTuner".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Type text to set it, :help for commands, \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while a request is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ 生成中...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_for_each_outcome() {
        let ok: SkillOutcome = SkillOutcome::Completed("done".into());
        assert_eq!(failure_text(&ok), None);

        let rejected: SkillOutcome = SkillOutcome::Rejected(ValidationError::MissingApiKey);
        assert_eq!(failure_text(&rejected).as_deref(), Some("请先配置API Key"));

        let failed: SkillOutcome = SkillOutcome::Failed("生成文案时出错: HTTP 500".into());
        assert_eq!(
            failure_text(&failed).as_deref(),
            Some("生成文案时出错: HTTP 500")
        );

        let cancelled: SkillOutcome = SkillOutcome::Cancelled;
        assert_eq!(failure_text(&cancelled).as_deref(), Some("已取消"));
    }

    #[test]
    fn report_errors_on_rejection() {
        let outcome: SkillOutcome = SkillOutcome::Rejected(ValidationError::EmptyInput);
        let err = report(Skill::Adjust, &outcome).unwrap_err();
        assert_eq!(err.to_string(), "请输入原始文案");
    }

    #[test]
    fn report_ok_on_completion() {
        let outcome: SkillOutcome = SkillOutcome::Completed("HELLO!!!".into());
        assert!(report(Skill::Adjust, &outcome).is_ok());
    }
}
