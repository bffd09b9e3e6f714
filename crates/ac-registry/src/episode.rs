//! `EpisodeManager` — start/end conditions and the handler lifecycle.
//!
//! # End-condition precedence
//!
//! `check_end` returns the first of:
//!
//! 1. an explicit [`request_end`](EpisodeManager::request_end) or a
//!    provider's `ProviderRequest::EndEpisode` posted on the context;
//! 2. the first active handler (dispatch order) returning `Some(reason)`;
//! 3. `MaxStepsReached` once `step_count >= max_steps`;
//! 4. `TimeLimit` once the episode has run `time_limit_secs`.

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind};
use ac_provider::EpisodeHandler;
use tracing::{debug, info};

use crate::{Registry, RegistryResult};

// ── EpisodeConfig ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeConfig {
    /// `0` disables the step limit.
    pub max_steps:       u64,
    /// `None` disables the time limit.
    pub time_limit_secs: Option<f64>,
    /// Begin a new episode immediately after one ends.
    pub auto_restart:    bool,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_steps:       0,
            time_limit_secs: None,
            auto_restart:    true,
        }
    }
}

// ── EpisodeManager ────────────────────────────────────────────────────────────

pub struct EpisodeManager {
    registry:           Registry<dyn EpisodeHandler>,
    config:             EpisodeConfig,
    pending_end:        Option<EpisodeEndReason>,
    episodes_completed: u64,
    last_reason:        Option<EpisodeEndReason>,
}

impl Default for EpisodeManager {
    fn default() -> Self {
        Self::new(EpisodeConfig::default())
    }
}

impl EpisodeManager {
    pub fn new(config: EpisodeConfig) -> Self {
        Self {
            registry:           Registry::new(ProviderKind::Episode),
            config,
            pending_end:        None,
            episodes_completed: 0,
            last_reason:        None,
        }
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EpisodeConfig {
        &mut self.config
    }

    pub fn registry(&self) -> &Registry<dyn EpisodeHandler> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn EpisodeHandler> {
        &mut self.registry
    }

    pub fn register(
        &mut self,
        handler: Box<dyn EpisodeHandler>,
        ctx:     &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(handler, ctx)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn EpisodeHandler>> {
        self.registry.unregister(name)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
    }

    // ── Start ─────────────────────────────────────────────────────────────

    /// `true` unless an active handler vetoes.  A handler that fails counts
    /// as having no objection.
    pub fn can_start(&mut self, ctx: &AgentContext) -> bool {
        self.registry
            .dispatch("should_start_episode", |h| h.should_start_episode(ctx))
            .into_iter()
            .all(|(_, r)| r.unwrap_or(true))
    }

    /// Begin a new episode on `ctx`, then notify every handler.
    ///
    /// Ends the current episode first (`ManualReset`) if one is still active.
    pub fn begin_episode(&mut self, ctx: &mut AgentContext) {
        if ctx.is_episode_active() {
            self.end_episode(ctx, EpisodeEndReason::ManualReset);
        }
        self.pending_end = None;
        ctx.begin_episode();
        self.registry.episode_begin(ctx);
        info!(agent = %ctx.agent_id(), episode = ctx.episode_count(), "episode started");
    }

    // ── End ───────────────────────────────────────────────────────────────

    /// Ask for the current episode to end at the next check.  The first
    /// request wins.
    pub fn request_end(&mut self, reason: EpisodeEndReason) {
        if self.pending_end.is_none() {
            self.pending_end = Some(reason);
        }
    }

    pub fn pending_end(&self) -> Option<EpisodeEndReason> {
        self.pending_end
    }

    /// Evaluate end conditions.  Does not end the episode.
    pub fn check_end(&mut self, ctx: &AgentContext) -> Option<EpisodeEndReason> {
        if !ctx.is_episode_active() {
            return None;
        }
        if let Some(reason) = self.pending_end.or(ctx.pending_episode_end()) {
            return Some(reason);
        }

        // Every handler is polled so each sees every step; the first opinion
        // in dispatch order wins.
        let from_handlers = self
            .registry
            .dispatch("should_end_episode", |h| h.should_end_episode(ctx))
            .into_iter()
            .find_map(|(_, r)| r.flatten());
        if from_handlers.is_some() {
            return from_handlers;
        }

        if self.config.max_steps > 0 && ctx.step_count() >= self.config.max_steps {
            return Some(EpisodeEndReason::MaxStepsReached);
        }
        if let Some(limit) = self.config.time_limit_secs {
            if ctx.episode_elapsed_secs() >= limit {
                return Some(EpisodeEndReason::TimeLimit);
            }
        }
        None
    }

    /// End the active episode: every active handler's `on_episode_end` runs
    /// exactly once, then the context fires its end callbacks.
    ///
    /// Returns `false` if no episode was active.
    pub fn end_episode(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) -> bool {
        if !ctx.is_episode_active() {
            debug!(agent = %ctx.agent_id(), %reason, "end requested with no active episode");
            return false;
        }
        self.pending_end = None;
        self.registry.episode_end(ctx, reason);
        ctx.end_episode(reason);
        self.episodes_completed += 1;
        self.last_reason = Some(reason);
        info!(
            agent = %ctx.agent_id(),
            episode = ctx.episode_count(),
            steps = ctx.step_count(),
            reward = ctx.cumulative_reward(),
            %reason,
            "episode ended"
        );
        true
    }

    pub fn update(&mut self, ctx: &mut AgentContext, delta_secs: f32) {
        self.registry.update(ctx, delta_secs);
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn episodes_completed(&self) -> u64 {
        self.episodes_completed
    }

    pub fn last_reason(&self) -> Option<EpisodeEndReason> {
        self.last_reason
    }
}
