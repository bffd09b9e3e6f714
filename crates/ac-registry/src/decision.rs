//! `DecisionRouter` — picks exactly one decision provider per step.
//!
//! # Selection policy
//!
//! ```text
//! Manual        bound provider active?  ── yes ──▶ delegate to it
//!                      │ no
//!                      ▼
//! Auto /        poll should_decide on every active provider (full scan);
//! PriorityOnly  highest priority among those answering true wins
//!                      │ nobody opted in
//!                      ▼
//!               Auto/Manual: default provider (configured id, else first
//!                            registered) if active
//!               PriorityOnly: no fallback
//!                      │ nothing to delegate to
//!                      ▼
//!               zero the action buffers
//! ```
//!
//! Equal priorities resolve by name ascending, the same order every registry
//! dispatches in.
//!
//! If the chosen provider fails (error or panic) the buffers are zeroed, so
//! a half-written or stale action never reaches the actuators.

use std::fmt;

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind};
use ac_provider::helpers::sanitize_slice;
use ac_provider::{ActionBuffers, DecisionProvider};
use tracing::{debug, info, warn};

use crate::{Registry, RegistryResult};

// ── Mode & config ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum DecisionMode {
    #[default]
    Auto,
    /// Always use the bound provider while it is active.
    Manual,
    /// Opt-in providers only; no default fallback.
    PriorityOnly,
}

impl DecisionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionMode::Auto         => "auto",
            DecisionMode::Manual       => "manual",
            DecisionMode::PriorityOnly => "priority_only",
        }
    }
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionConfig {
    pub mode:                DecisionMode,
    pub manual_provider_id:  Option<String>,
    /// Fallback when nobody opts in.  `None` means the first registered
    /// provider.
    pub default_provider_id: Option<String>,
}

/// What happened on one `decide_action` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// The named provider was selected and wrote the actions.
    Delegated { provider: String },
    /// Nobody opted in; the default provider wrote the actions.
    Fallback { provider: String },
    /// No provider was available; the buffers were zeroed.
    Cleared,
    /// The selected provider failed; the buffers were zeroed.
    Failed { provider: String },
}

impl DecisionOutcome {
    /// The provider that was selected, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            DecisionOutcome::Delegated { provider }
            | DecisionOutcome::Fallback { provider }
            | DecisionOutcome::Failed { provider } => Some(provider),
            DecisionOutcome::Cleared => None,
        }
    }

    /// `true` if a provider produced this step's actions.
    pub fn is_delegated(&self) -> bool {
        matches!(self, DecisionOutcome::Delegated { .. } | DecisionOutcome::Fallback { .. })
    }
}

// ── DecisionRouter ────────────────────────────────────────────────────────────

pub struct DecisionRouter {
    registry:         Registry<dyn DecisionProvider>,
    config:           DecisionConfig,
    /// Resolved default provider name.
    default_provider: Option<String>,
    last_outcome:     Option<DecisionOutcome>,
    decisions:        u64,
}

impl Default for DecisionRouter {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

impl DecisionRouter {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            registry:         Registry::new(ProviderKind::Decision),
            config,
            default_provider: None,
            last_outcome:     None,
            decisions:        0,
        }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn mode(&self) -> DecisionMode {
        self.config.mode
    }

    pub fn registry(&self) -> &Registry<dyn DecisionProvider> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn DecisionProvider> {
        &mut self.registry
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Add a provider.  Duplicate ids are rejected (and logged).
    pub fn add_decision_provider(
        &mut self,
        provider: Box<dyn DecisionProvider>,
        ctx:      &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(provider, ctx)?;
        self.resolve_default();
        Ok(())
    }

    /// Remove a provider by id.  If it was the default, the default is
    /// re-resolved.
    pub fn remove_decision_provider(&mut self, id: &str) -> Option<Box<dyn DecisionProvider>> {
        let removed = self.registry.unregister(id)?;
        if self.default_provider.as_deref() == Some(id) {
            self.resolve_default();
            debug!(removed = %id, default = ?self.default_provider, "default decision provider re-resolved");
        }
        Some(removed)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
        self.resolve_default();
    }

    /// The configured default if registered, otherwise the earliest
    /// registered provider still present.
    fn resolve_default(&mut self) {
        let configured = self
            .config
            .default_provider_id
            .as_deref()
            .filter(|id| self.registry.contains(id))
            .map(str::to_string);
        self.default_provider = configured.or_else(|| {
            (0..self.registry.len())
                .min_by_key(|&i| self.registry.seq_at(i))
                .and_then(|i| self.registry.name_at(i))
                .map(str::to_string)
        });
    }

    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Switch mode.  `provider_id` rebinds the manual provider in `Manual`
    /// mode and the default provider otherwise.
    pub fn set_decision_mode(&mut self, mode: DecisionMode, provider_id: Option<String>) {
        let previous = self.config.mode;
        self.config.mode = mode;
        if let Some(id) = provider_id {
            if mode == DecisionMode::Manual {
                self.config.manual_provider_id = Some(id);
            } else {
                self.config.default_provider_id = Some(id);
                self.resolve_default();
            }
        }
        info!(
            from = %previous,
            to = %mode,
            manual = ?self.config.manual_provider_id,
            default = ?self.default_provider,
            "decision mode changed"
        );
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Index of the manually bound provider, if it is active.
    fn manual_choice(&self) -> Option<usize> {
        let id = self.config.manual_provider_id.as_deref()?;
        self.registry.index_of(id).filter(|&i| self.registry.is_dispatchable(i))
    }

    /// Poll every active provider and return the highest-priority one that
    /// opted in.
    fn priority_choice(&mut self, ctx: &AgentContext, observations: &[f32]) -> Option<usize> {
        let mut best: Option<(usize, i32)> = None;
        for (idx, wants) in self
            .registry
            .dispatch("should_decide", |p| p.should_decide(ctx, observations))
        {
            if wants != Some(true) {
                continue;
            }
            let priority = self.registry.priority_at(idx).unwrap_or(i32::MIN);
            // Strictly greater: on equal priority the earlier (name-ascending)
            // entry keeps the slot.
            if best.is_none_or(|(_, p)| priority > p) {
                best = Some((idx, priority));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn default_choice(&self) -> Option<usize> {
        let name = self.default_provider.as_deref()?;
        self.registry.index_of(name).filter(|&i| self.registry.is_dispatchable(i))
    }

    /// Name of the provider that would be chosen without delegating.  Polls
    /// `should_decide`, so providers see the call.
    pub fn select(&mut self, ctx: &AgentContext, observations: &[f32]) -> Option<String> {
        self.choose(ctx, observations)
            .and_then(|(idx, _)| self.registry.name_at(idx))
            .map(str::to_string)
    }

    /// `(index, is_fallback)` of the provider to delegate to.
    fn choose(&mut self, ctx: &AgentContext, observations: &[f32]) -> Option<(usize, bool)> {
        if self.config.mode == DecisionMode::Manual {
            if let Some(idx) = self.manual_choice() {
                return Some((idx, false));
            }
        }
        if let Some(idx) = self.priority_choice(ctx, observations) {
            return Some((idx, false));
        }
        if self.config.mode == DecisionMode::PriorityOnly {
            return None;
        }
        self.default_choice().map(|idx| (idx, true))
    }

    /// Select a provider and let it write `actions`.
    ///
    /// The buffers are zeroed when nothing is selected or the selected
    /// provider fails.  Non-finite continuous values written by a provider
    /// are replaced with `0.0`.
    pub fn decide_action(
        &mut self,
        ctx:          &AgentContext,
        observations: &[f32],
        actions:      &mut ActionBuffers,
    ) -> DecisionOutcome {
        self.decisions += 1;

        let outcome = match self.choose(ctx, observations) {
            None => {
                actions.clear();
                debug!(agent = %ctx.agent_id(), mode = %self.config.mode, "no decision provider; actions cleared");
                DecisionOutcome::Cleared
            }
            Some((idx, fallback)) => {
                let provider = self.registry.name_at(idx).unwrap_or_default().to_string();
                let ok = self
                    .registry
                    .call(idx, "decide_action", |p| p.decide_action(ctx, observations, actions))
                    .is_some();
                if !ok {
                    actions.clear();
                    warn!(agent = %ctx.agent_id(), provider = %provider, "decision failed; actions cleared");
                    DecisionOutcome::Failed { provider }
                } else {
                    let replaced = sanitize_slice(&mut actions.continuous);
                    if replaced > 0 {
                        warn!(provider = %provider, replaced, "non-finite actions replaced with 0");
                    }
                    if fallback {
                        DecisionOutcome::Fallback { provider }
                    } else {
                        DecisionOutcome::Delegated { provider }
                    }
                }
            }
        };

        self.last_outcome = Some(outcome.clone());
        outcome
    }

    // ── Introspection / lifecycle ─────────────────────────────────────────

    pub fn last_outcome(&self) -> Option<&DecisionOutcome> {
        self.last_outcome.as_ref()
    }

    /// Provider that produced the last decision, if any.
    pub fn last_decider(&self) -> Option<&str> {
        self.last_outcome.as_ref().filter(|o| o.is_delegated()).and_then(|o| o.provider())
    }

    pub fn decision_count(&self) -> u64 {
        self.decisions
    }

    pub fn on_episode_begin(&mut self, ctx: &mut AgentContext) {
        self.registry.episode_begin(ctx);
    }

    pub fn on_episode_end(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) {
        self.registry.episode_end(ctx, reason);
    }

    pub fn update(&mut self, ctx: &mut AgentContext, delta_secs: f32) {
        self.registry.update(ctx, delta_secs);
    }
}
