//! TextTuner skills — prompt catalog, style levels, and the studio that
//! runs each skill against the shared session.
//!
//! This crate contains:
//! - **prompts**: pure prompt builders, one per skill
//! - **levels**: the -2..=2 style range, display labels, reply parsing
//! - **skill**: skill identifiers and the [`SkillOutcome`] every handler returns
//! - **studio**: the handlers, the detect → critique chain, stale-response policy
//! - **export**: the [`Exporter`] seam and a Markdown card writer

pub mod export;
pub mod levels;
pub mod prompts;
pub mod skill;
pub mod studio;

pub use export::{ExportArtifact, Exporter, MarkdownCardExporter};
pub use levels::{level_label, parse_level, MAX_STYLE_LEVEL, MIN_STYLE_LEVEL};
pub use skill::{DetectReport, Detection, Skill, SkillOutcome, FAILURE_PLACEHOLDER};
pub use studio::Studio;
