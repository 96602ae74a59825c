//! Session state — user input, chosen style level, settings, and one
//! result slot per skill.
//!
//! Only `originalText`, `styleLevel`, `detectedLevel`, and `settings` are
//! persisted; result slots live for the lifetime of the process.

use serde::{Deserialize, Serialize};

/// Provider used when nothing has been persisted yet.
pub const DEFAULT_PROVIDER: &str = "google";

/// Identifier of the synthetic provider whose base URL is user supplied.
pub const CUSTOM_PROVIDER: &str = "custom";

// ─────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────

/// Active provider selection and credential.
///
/// For any provider other than `custom`, `base_url` and `model` are seeded
/// from the registry; `api_key` is never defaulted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            base_url: String::new(),
            model: String::new(),
            api_key: String::new(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &crate::utils::mask_secret(&self.api_key))
            .finish()
    }
}

impl Settings {
    /// Whether a credential has been entered.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn is_custom(&self) -> bool {
        self.provider == CUSTOM_PROVIDER
    }
}

/// Registry-provided defaults, used to seed settings fields that are absent.
///
/// Implemented by the provider registry; kept as a seam here so the
/// persistence layer does not depend on it.
pub trait ProviderDefaults {
    /// `(base_url, default_model)` for a provider, or `None` if unknown.
    fn defaults_for(&self, provider: &str) -> Option<(String, String)>;

    /// Settings for a first run: the default provider with its registry values.
    fn default_settings(&self) -> Settings {
        let (base_url, model) = self.defaults_for(DEFAULT_PROVIDER).unwrap_or_default();
        Settings {
            provider: DEFAULT_PROVIDER.to_string(),
            base_url,
            model,
            api_key: String::new(),
        }
    }
}

// ─────────────────────────────────────────────
// Result slots
// ─────────────────────────────────────────────

/// Named result slot, one per skill that produces text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultSlot {
    Adjust,
    Critique,
    TruthAnalysis,
    HiddenMeaning,
    StyleSummary,
    Imitation,
    Continuation,
    Expansion,
}

impl ResultSlot {
    pub const ALL: [ResultSlot; 8] = [
        ResultSlot::Adjust,
        ResultSlot::Critique,
        ResultSlot::TruthAnalysis,
        ResultSlot::HiddenMeaning,
        ResultSlot::StyleSummary,
        ResultSlot::Imitation,
        ResultSlot::Continuation,
        ResultSlot::Expansion,
    ];
}

/// Independent result strings; computing one never touches another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkillResults {
    pub adjust: String,
    pub critique: String,
    pub truth_analysis: String,
    pub hidden_meaning: String,
    pub style_summary: String,
    pub imitation: String,
    pub continuation: String,
    pub expansion: String,
}

impl SkillResults {
    pub fn get(&self, slot: ResultSlot) -> &str {
        match slot {
            ResultSlot::Adjust => &self.adjust,
            ResultSlot::Critique => &self.critique,
            ResultSlot::TruthAnalysis => &self.truth_analysis,
            ResultSlot::HiddenMeaning => &self.hidden_meaning,
            ResultSlot::StyleSummary => &self.style_summary,
            ResultSlot::Imitation => &self.imitation,
            ResultSlot::Continuation => &self.continuation,
            ResultSlot::Expansion => &self.expansion,
        }
    }

    /// Replace the whole slot in one assignment.
    pub fn set(&mut self, slot: ResultSlot, value: String) {
        let target = match slot {
            ResultSlot::Adjust => &mut self.adjust,
            ResultSlot::Critique => &mut self.critique,
            ResultSlot::TruthAnalysis => &mut self.truth_analysis,
            ResultSlot::HiddenMeaning => &mut self.hidden_meaning,
            ResultSlot::StyleSummary => &mut self.style_summary,
            ResultSlot::Imitation => &mut self.imitation,
            ResultSlot::Continuation => &mut self.continuation,
            ResultSlot::Expansion => &mut self.expansion,
        };
        *target = value;
    }
}

// ─────────────────────────────────────────────
// SessionState
// ─────────────────────────────────────────────

/// The full in-memory snapshot the skills read from and write to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub original_text: String,
    /// Requested style level for the adjust skill.
    pub style_level: i32,
    /// Level reported by the last successful detection.
    pub detected_level: Option<i32>,
    pub settings: Settings,
    pub results: SkillResults,
}

impl SessionState {
    /// Fresh state with the given settings and everything else empty.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }
}
