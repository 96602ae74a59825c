//! Skill identifiers and the outcome every handler returns.
//!
//! Handlers never propagate errors to their caller: validation problems,
//! provider failures, and cancellation all come back as a
//! [`SkillOutcome`] the front end can render directly.

use texttuner_core::error::ValidationError;
use texttuner_core::state::ResultSlot;
use texttuner_core::utils::truncate_string;
use texttuner_core::TunerError;

/// Written into an auxiliary slot when its request fails.
pub const FAILURE_PLACEHOLDER: &str = "生成失败，请重试";

// ─────────────────────────────────────────────
// Skill
// ─────────────────────────────────────────────

/// One user-invocable operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Skill {
    Adjust,
    Detect,
    Critique,
    TruthAnalysis,
    HiddenMeaning,
    StyleSummary,
    Imitation,
    Continuation,
    Expansion,
}

impl Skill {
    pub const ALL: [Skill; 9] = [
        Skill::Adjust,
        Skill::Detect,
        Skill::Critique,
        Skill::TruthAnalysis,
        Skill::HiddenMeaning,
        Skill::StyleSummary,
        Skill::Imitation,
        Skill::Continuation,
        Skill::Expansion,
    ];

    /// Stable identifier used in logs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Skill::Adjust => "adjust",
            Skill::Detect => "detect",
            Skill::Critique => "critique",
            Skill::TruthAnalysis => "truth",
            Skill::HiddenMeaning => "hidden",
            Skill::StyleSummary => "summary",
            Skill::Imitation => "imitate",
            Skill::Continuation => "continue",
            Skill::Expansion => "expand",
        }
    }

    pub fn from_name(name: &str) -> Option<Skill> {
        Skill::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Human-facing heading for the skill's output.
    pub fn title(self) -> &'static str {
        match self {
            Skill::Adjust => "调整结果",
            Skill::Detect => "包装等级",
            Skill::Critique => "犀利点评",
            Skill::TruthAnalysis => "真实含义",
            Skill::HiddenMeaning => "言外之意",
            Skill::StyleSummary => "风格总结",
            Skill::Imitation => "风格模仿",
            Skill::Continuation => "续写",
            Skill::Expansion => "扩写",
        }
    }

    /// Slot the skill writes. Detection writes the detected level instead.
    pub fn slot(self) -> Option<ResultSlot> {
        match self {
            Skill::Adjust => Some(ResultSlot::Adjust),
            Skill::Detect => None,
            Skill::Critique => Some(ResultSlot::Critique),
            Skill::TruthAnalysis => Some(ResultSlot::TruthAnalysis),
            Skill::HiddenMeaning => Some(ResultSlot::HiddenMeaning),
            Skill::StyleSummary => Some(ResultSlot::StyleSummary),
            Skill::Imitation => Some(ResultSlot::Imitation),
            Skill::Continuation => Some(ResultSlot::Continuation),
            Skill::Expansion => Some(ResultSlot::Expansion),
        }
    }

    pub fn for_slot(slot: ResultSlot) -> Skill {
        match slot {
            ResultSlot::Adjust => Skill::Adjust,
            ResultSlot::Critique => Skill::Critique,
            ResultSlot::TruthAnalysis => Skill::TruthAnalysis,
            ResultSlot::HiddenMeaning => Skill::HiddenMeaning,
            ResultSlot::StyleSummary => Skill::StyleSummary,
            ResultSlot::Imitation => Skill::Imitation,
            ResultSlot::Continuation => Skill::Continuation,
            ResultSlot::Expansion => Skill::Expansion,
        }
    }

    /// Primary skills leave their state untouched on failure; auxiliary
    /// skills overwrite their slot with [`FAILURE_PLACEHOLDER`].
    pub fn is_primary(self) -> bool {
        matches!(self, Skill::Adjust | Skill::Detect)
    }
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────

/// What a skill invocation amounted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkillOutcome<T = String> {
    /// The provider answered and the result was stored.
    Completed(T),
    /// A precondition failed; no request was sent.
    Rejected(ValidationError),
    /// The request failed; carries a user-facing message.
    Failed(String),
    /// Cancelled, or superseded by a newer invocation of the same skill.
    /// State was not touched.
    Cancelled,
}

impl<T> SkillOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, SkillOutcome::Completed(_))
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            SkillOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SkillOutcome<U> {
        match self {
            SkillOutcome::Completed(value) => SkillOutcome::Completed(f(value)),
            SkillOutcome::Rejected(e) => SkillOutcome::Rejected(e),
            SkillOutcome::Failed(msg) => SkillOutcome::Failed(msg),
            SkillOutcome::Cancelled => SkillOutcome::Cancelled,
        }
    }
}

/// Result of detection plus the critique it triggered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    pub level: i32,
    /// Display label from the level table, or `未知`.
    pub label: String,
}

/// Detection followed by critique. `critique` is `None` when detection
/// did not complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectReport {
    pub detection: SkillOutcome<Detection>,
    pub critique: Option<SkillOutcome>,
}

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// User-facing message for a validation failure.
pub fn rejection_message(error: &ValidationError) -> String {
    match error {
        ValidationError::EmptyInput => "请输入原始文案".into(),
        ValidationError::MissingApiKey => "请先配置API Key".into(),
        ValidationError::MissingModel => "请先选择模型".into(),
        ValidationError::MissingBaseUrl => "请先配置自定义 Base URL".into(),
        ValidationError::UnknownProvider(id) => format!("未知的服务商: {id}"),
        ValidationError::FixedBaseUrl(id) => {
            format!("{id} 的 Base URL 不可修改，请切换到 custom")
        }
        ValidationError::LevelOutOfRange(level) => {
            format!("包装等级 {level} 超出范围 (-2 到 2)")
        }
        ValidationError::EmptyTopic => "请输入模仿主题".into(),
        ValidationError::NothingToExport => "暂无可导出的内容".into(),
    }
}

/// User-facing message for a failed request.
pub fn failure_message(error: &TunerError) -> String {
    match error {
        TunerError::Validation(e) => rejection_message(e),
        TunerError::RequestFailed { status, body } if body.trim().is_empty() => {
            format!("生成文案时出错: HTTP {status}")
        }
        TunerError::RequestFailed { status, body } => {
            format!("生成文案时出错: HTTP {status} {}", truncate_string(body, 120))
        }
        TunerError::MalformedResponse(_) => "生成文案时出错: 响应格式无法解析".into(),
        TunerError::Transport(e) => format!("生成文案时出错: 网络错误 ({e})"),
        TunerError::TimedOut(after) => {
            format!("生成文案时出错: 请求超时 ({}s)", after.as_secs())
        }
        TunerError::Cancelled => "请求已取消".into(),
        TunerError::Storage(e) => format!("保存失败: {e}"),
    }
}
