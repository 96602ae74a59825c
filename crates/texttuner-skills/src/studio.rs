//! Studio — the skill handlers over one shared session.
//!
//! Every text skill follows the same path:
//!
//! ```text
//! prepare   input guards, prompt, credential guard, resolve provider
//! begin     bump the skill's generation, hand out a cancel token
//! complete  orchestrator (busy flag, cancel, timeout)
//! settle    drop stale responses under DiscardStale
//! apply     write the slot, or the failure placeholder for auxiliaries
//! ```
//!
//! Detection shares the path but parses a level instead of filling a slot.
//! A reset bumps the session epoch; a response whose input predates the
//! current epoch is dropped at `apply`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use texttuner_core::config::ResponsePolicy;
use texttuner_core::error::{StorageError, ValidationError};
use texttuner_core::state::{
    clear_state, load_state, save_state, KeyValueStore, ResultSlot, SessionState,
};
use texttuner_core::utils::truncate_string;
use texttuner_core::{ProviderDefaults, Settings, TunerError};
use texttuner_providers::{resolve, Orchestrator, ProviderRegistry, ResolvedProvider, SettingsUpdate};

use crate::export::{ExportArtifact, Exporter};
use crate::levels::{level_label, parse_level, validate_style_level};
use crate::prompts;
use crate::skill::{
    failure_message, DetectReport, Detection, Skill, SkillOutcome, FAILURE_PLACEHOLDER,
};

/// Everything one request needs, captured from a single state snapshot.
struct Prepared {
    provider: ResolvedProvider,
    input: String,
    prompt: String,
    epoch: u64,
}

/// Handed out when a request starts; checked when it settles.
struct Ticket {
    generation: u64,
    token: CancellationToken,
}

/// Requests are tracked per lane: one per skill, plus model listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Lane {
    Skill(Skill),
    Models,
}

impl Lane {
    fn name(self) -> &'static str {
        match self {
            Lane::Skill(skill) => skill.name(),
            Lane::Models => "models",
        }
    }
}

#[derive(Default)]
struct InFlight {
    generation: u64,
    /// Every unsettled request of the lane, oldest first.
    live: Vec<(u64, CancellationToken)>,
}

// ─────────────────────────────────────────────
// Studio
// ─────────────────────────────────────────────

/// Session state plus the machinery to run skills against it.
///
/// All methods take `&self`; share the studio behind an `Arc` to run
/// skills concurrently.
pub struct Studio {
    registry: Arc<ProviderRegistry>,
    orchestrator: Orchestrator,
    store: Arc<dyn KeyValueStore>,
    policy: ResponsePolicy,
    state: Mutex<SessionState>,
    epoch: AtomicU64,
    inflight: Mutex<HashMap<Lane, InFlight>>,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("orchestrator", &self.orchestrator)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Studio {
    /// Create a studio over an explicit starting state.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        orchestrator: Orchestrator,
        store: Arc<dyn KeyValueStore>,
        state: SessionState,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            store,
            policy: ResponsePolicy::default(),
            state: Mutex::new(state),
            epoch: AtomicU64::new(0),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Create a studio hydrated from `store`.
    pub fn load(
        registry: Arc<ProviderRegistry>,
        orchestrator: Orchestrator,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let state = load_state(store.as_ref(), &*registry);
        debug!(
            provider = %state.settings.provider,
            has_text = !state.original_text.is_empty(),
            "Session state loaded"
        );
        Self::new(registry, orchestrator, store, state)
    }

    pub fn with_policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ResponsePolicy {
        self.policy
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Whether any request is in flight.
    pub fn is_busy(&self) -> bool {
        self.orchestrator.is_busy()
    }

    // ────────────── State access ──────────────

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn inflight(&self) -> MutexGuard<'_, HashMap<Lane, InFlight>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    pub fn settings(&self) -> Settings {
        self.state().settings.clone()
    }

    pub fn result(&self, slot: ResultSlot) -> String {
        self.state().results.get(slot).to_string()
    }

    pub fn set_original_text(&self, text: impl Into<String>) {
        self.state().original_text = text.into();
    }

    /// Set the adjust level; out-of-range values leave the level unchanged.
    pub fn set_style_level(&self, level: i32) -> Result<(), ValidationError> {
        let level = validate_style_level(level)?;
        self.state().style_level = level;
        Ok(())
    }

    /// Apply a settings change and persist it.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings, ValidationError> {
        let settings = {
            let mut state = self.state();
            update.apply(&mut state.settings, &self.registry)?;
            state.settings.clone()
        };
        info!(provider = %settings.provider, model = %settings.model, "Settings updated");
        self.persist();
        Ok(settings)
    }

    /// Write the persisted record now.
    pub fn save(&self) -> Result<(), StorageError> {
        let snapshot = self.snapshot();
        save_state(self.store.as_ref(), &snapshot)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to persist session state");
        }
    }

    /// Clear text, levels, and results. Settings survive.
    ///
    /// In-flight requests are cancelled and can no longer write into the
    /// cleared session.
    pub fn reset(&self) {
        self.cancel_all();
        {
            let mut state = self.state();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            let settings = std::mem::take(&mut state.settings);
            *state = SessionState::with_settings(settings);
        }
        info!("Session reset");
        self.persist();
    }

    /// Forget everything, settings included, and remove the persisted record.
    pub fn reset_all(&self) -> Result<(), StorageError> {
        self.cancel_all();
        {
            let mut state = self.state();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::with_settings(self.registry.default_settings());
        }
        info!("Session and settings reset");
        clear_state(self.store.as_ref())
    }

    // ────────────── Cancellation ──────────────

    /// Cancel every in-flight request of `skill`. Returns whether there
    /// was one.
    pub fn cancel(&self, skill: Skill) -> bool {
        self.cancel_lane(Lane::Skill(skill))
    }

    /// Cancel everything in flight, model listing included.
    pub fn cancel_all(&self) {
        for skill in Skill::ALL {
            self.cancel(skill);
        }
        self.cancel_lane(Lane::Models);
    }

    fn cancel_lane(&self, lane: Lane) -> bool {
        let live = self
            .inflight()
            .get_mut(&lane)
            .map(|entry| std::mem::take(&mut entry.live))
            .unwrap_or_default();
        if live.is_empty() {
            return false;
        }
        debug!(lane = lane.name(), count = live.len(), "Cancelling requests");
        for (_, token) in live {
            token.cancel();
        }
        true
    }

    fn begin(&self, lane: Lane) -> Ticket {
        let mut inflight = self.inflight();
        let entry = inflight.entry(lane).or_default();
        if self.policy == ResponsePolicy::DiscardStale {
            for (_, previous) in entry.live.drain(..) {
                debug!(lane = lane.name(), "Superseding in-flight request");
                previous.cancel();
            }
        }
        entry.generation += 1;
        let token = CancellationToken::new();
        entry.live.push((entry.generation, token.clone()));
        Ticket {
            generation: entry.generation,
            token,
        }
    }

    /// Whether a settled response may be applied. Cancelled tickets never are.
    fn settle(&self, lane: Lane, ticket: &Ticket) -> bool {
        let mut inflight = self.inflight();
        let Some(entry) = inflight.get_mut(&lane) else {
            return false;
        };
        entry.live.retain(|(generation, _)| *generation != ticket.generation);
        if ticket.token.is_cancelled() {
            return false;
        }
        entry.generation == ticket.generation || self.policy == ResponsePolicy::LastResponseWins
    }

    /// Run `write` against the session unless it was reset since `epoch`.
    fn apply(&self, epoch: u64, write: impl FnOnce(&mut SessionState)) -> bool {
        let mut state = self.state();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        write(&mut state);
        true
    }

    // ────────────── Dispatch ──────────────

    /// Input guards run before the prompt builder, credentials after it.
    fn prepare(
        &self,
        prompt: impl FnOnce(&SessionState) -> Result<String, ValidationError>,
    ) -> Result<Prepared, ValidationError> {
        let state = self.state();
        if state.original_text.trim().is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        let prompt = prompt(&state)?;
        let provider = self.resolve_provider(&state.settings)?;
        Ok(Prepared {
            provider,
            input: state.original_text.clone(),
            prompt,
            epoch: self.epoch.load(Ordering::SeqCst),
        })
    }

    fn resolve_provider(&self, settings: &Settings) -> Result<ResolvedProvider, ValidationError> {
        if !settings.has_api_key() {
            return Err(ValidationError::MissingApiKey);
        }
        resolve(settings, &self.registry)
    }

    /// Run the request. `None` means the response was stale and dropped.
    async fn dispatch(
        &self,
        skill: Skill,
        prepared: &Prepared,
    ) -> Option<Result<String, TunerError>> {
        let lane = Lane::Skill(skill);
        let ticket = self.begin(lane);
        debug!(
            skill = skill.name(),
            generation = ticket.generation,
            provider = %prepared.provider.provider,
            model = %prepared.provider.model,
            "Running skill"
        );

        let result = self
            .orchestrator
            .complete(
                &prepared.provider,
                &prepared.input,
                Some(&prepared.prompt),
                Some(&ticket.token),
            )
            .await;

        if self.settle(lane, &ticket) {
            Some(result)
        } else {
            debug!(skill = skill.name(), generation = ticket.generation, "Discarding stale response");
            None
        }
    }

    fn reject<T>(&self, skill: Skill, error: ValidationError) -> SkillOutcome<T> {
        info!(skill = skill.name(), reason = %error, "Skill rejected");
        SkillOutcome::Rejected(error)
    }

    fn fail<T>(&self, skill: Skill, error: TunerError, epoch: u64) -> SkillOutcome<T> {
        match error {
            TunerError::Cancelled => SkillOutcome::Cancelled,
            TunerError::Validation(e) => self.reject(skill, e),
            error => {
                warn!(skill = skill.name(), error = %error, "Skill failed");
                if !skill.is_primary() {
                    if let Some(slot) = skill.slot() {
                        self.apply(epoch, |state| {
                            state.results.set(slot, FAILURE_PLACEHOLDER.to_string())
                        });
                    }
                }
                SkillOutcome::Failed(failure_message(&error))
            }
        }
    }

    async fn run_text(
        &self,
        skill: Skill,
        prompt: impl FnOnce(&SessionState) -> Result<String, ValidationError>,
    ) -> SkillOutcome {
        let prepared = match self.prepare(prompt) {
            Ok(prepared) => prepared,
            Err(e) => return self.reject(skill, e),
        };

        let Some(result) = self.dispatch(skill, &prepared).await else {
            return SkillOutcome::Cancelled;
        };

        match result {
            Ok(text) => {
                let applied = self.apply(prepared.epoch, |state| {
                    if let Some(slot) = skill.slot() {
                        state.results.set(slot, text.clone());
                    }
                });
                if !applied {
                    debug!(skill = skill.name(), "Session reset while in flight, dropping response");
                    return SkillOutcome::Cancelled;
                }
                info!(skill = skill.name(), chars = text.chars().count(), "Skill completed");
                if skill.is_primary() {
                    self.persist();
                }
                SkillOutcome::Completed(text)
            }
            Err(e) => self.fail(skill, e, prepared.epoch),
        }
    }

    // ────────────── Skills ──────────────

    /// Rewrite the original text at the current style level.
    pub async fn generate_text(&self) -> SkillOutcome {
        self.run_text(Skill::Adjust, |state| {
            let level = validate_style_level(state.style_level)?;
            Ok(prompts::style_adjust(level))
        })
        .await
    }

    /// Classify the original text. On success the detected level is
    /// stored and persisted.
    pub async fn detect_style(&self) -> SkillOutcome<Detection> {
        let skill = Skill::Detect;
        let prepared = match self.prepare(|_| Ok(prompts::detect_style())) {
            Ok(prepared) => prepared,
            Err(e) => return self.reject(skill, e),
        };

        let Some(result) = self.dispatch(skill, &prepared).await else {
            return SkillOutcome::Cancelled;
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => return self.fail(skill, e, prepared.epoch),
        };

        match parse_level(&reply) {
            Some(level) => {
                if !self.apply(prepared.epoch, |state| state.detected_level = Some(level)) {
                    debug!("Session reset while in flight, dropping detection");
                    return SkillOutcome::Cancelled;
                }
                let label = level_label(level);
                info!(level, label = %label, "Style detected");
                self.persist();
                SkillOutcome::Completed(Detection { level, label })
            }
            None => {
                warn!(reply = %truncate_string(&reply, 80), "Detection reply is not a level");
                SkillOutcome::Failed(format!(
                    "无法识别包装等级: {}",
                    truncate_string(reply.trim(), 40)
                ))
            }
        }
    }

    /// Explain why the text sits at `level`.
    pub async fn critique(&self, level: i32) -> SkillOutcome {
        self.run_text(Skill::Critique, move |_| Ok(prompts::critique(level)))
            .await
    }

    /// Detect, then critique at the detected level.
    pub async fn detect_and_critique(&self) -> DetectReport {
        let detection = self.detect_style().await;
        let critique = match &detection {
            SkillOutcome::Completed(d) => Some(self.critique(d.level).await),
            _ => None,
        };
        DetectReport {
            detection,
            critique,
        }
    }

    pub async fn truth_analysis(&self) -> SkillOutcome {
        self.run_text(Skill::TruthAnalysis, |_| Ok(prompts::truth_analysis()))
            .await
    }

    pub async fn hidden_meaning(&self) -> SkillOutcome {
        self.run_text(Skill::HiddenMeaning, |_| Ok(prompts::hidden_meaning()))
            .await
    }

    pub async fn style_summary(&self) -> SkillOutcome {
        self.run_text(Skill::StyleSummary, |_| Ok(prompts::style_summary()))
            .await
    }

    /// Write about `topic` in the style of the original text.
    pub async fn imitate(&self, topic: &str) -> SkillOutcome {
        self.run_text(Skill::Imitation, |_| {
            let topic = topic.trim();
            if topic.is_empty() {
                return Err(ValidationError::EmptyTopic);
            }
            Ok(prompts::imitation(topic))
        })
        .await
    }

    pub async fn continuation(&self) -> SkillOutcome {
        self.run_text(Skill::Continuation, |_| Ok(prompts::continuation()))
            .await
    }

    pub async fn expansion(&self) -> SkillOutcome {
        self.run_text(Skill::Expansion, |_| Ok(prompts::expansion()))
            .await
    }

    // ────────────── Models & export ──────────────

    /// List the provider's models and remember them in the registry.
    pub async fn fetch_models(&self) -> SkillOutcome<Vec<String>> {
        let provider = match self.resolve_provider(&self.settings()) {
            Ok(provider) => provider,
            Err(e) => {
                info!(reason = %e, "Model listing rejected");
                return SkillOutcome::Rejected(e);
            }
        };

        let ticket = self.begin(Lane::Models);
        let result = self
            .orchestrator
            .list_models(&provider, Some(&ticket.token))
            .await;
        if !self.settle(Lane::Models, &ticket) {
            return SkillOutcome::Cancelled;
        }

        match result {
            Ok(models) => {
                info!(provider = %provider.provider, count = models.len(), "Models fetched");
                self.registry.record_models(&provider.provider, models.clone());
                SkillOutcome::Completed(models)
            }
            Err(TunerError::Cancelled) => SkillOutcome::Cancelled,
            Err(e) => SkillOutcome::Failed(failure_message(&e)),
        }
    }

    /// Export the content of `slot`.
    pub fn export(&self, slot: ResultSlot, exporter: &dyn Exporter) -> SkillOutcome<ExportArtifact> {
        let text = self.result(slot);
        if text.trim().is_empty() {
            return SkillOutcome::Rejected(ValidationError::NothingToExport);
        }
        match exporter.export(Skill::for_slot(slot).title(), &text) {
            Ok(artifact) => SkillOutcome::Completed(artifact),
            Err(e) => {
                warn!(error = %e, "Export failed");
                SkillOutcome::Failed(format!("导出失败: {e}"))
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
