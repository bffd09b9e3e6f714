//! `RewardCalculator` — priority-ordered fan-in of per-step rewards.
//!
//! # Per-step pipeline
//!
//! ```text
//! for provider in (priority desc, name asc), active only:
//!     raw = provider.calculate_reward(ctx, dt)     // pre-weighted
//!     Err / panic / NaN / ±inf  →  0.0  (logged)
//!     record contribution
//! total = Σ raw
//! total non-finite              →  0.0, step flagged invalid
//! clamp_total_reward            →  total.clamp(min, max)
//! episode_cumulative += total;  ctx.add_reward(total)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind};
use ac_provider::{RewardEvent, RewardProvider};
use tracing::{debug, warn};

use crate::{Registry, RegistryResult};

// ── RewardConfig ──────────────────────────────────────────────────────────────

/// Safety bounds for the aggregated step reward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardConfig {
    pub clamp_total_reward:  bool,
    pub min_reward_per_step: f32,
    pub max_reward_per_step: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            clamp_total_reward:  false,
            min_reward_per_step: -1.0,
            max_reward_per_step: 1.0,
        }
    }
}

impl RewardConfig {
    pub fn clamped(min: f32, max: f32) -> Self {
        Self { clamp_total_reward: true, min_reward_per_step: min, max_reward_per_step: max }
    }

    /// Swap inverted bounds and disable clamping on non-finite bounds, so
    /// `f32::clamp` can never panic.
    fn normalized(mut self) -> Self {
        if !self.min_reward_per_step.is_finite() || !self.max_reward_per_step.is_finite() {
            if self.clamp_total_reward {
                warn!(
                    min = self.min_reward_per_step,
                    max = self.max_reward_per_step,
                    "non-finite reward bounds; clamping disabled"
                );
            }
            self.clamp_total_reward = false;
        } else if self.min_reward_per_step > self.max_reward_per_step {
            warn!(
                min = self.min_reward_per_step,
                max = self.max_reward_per_step,
                "inverted reward bounds; swapping"
            );
            std::mem::swap(&mut self.min_reward_per_step, &mut self.max_reward_per_step);
        }
        self
    }
}

// ── RewardCalculator ──────────────────────────────────────────────────────────

pub struct RewardCalculator {
    registry: Registry<dyn RewardProvider>,
    config:   RewardConfig,

    /// This step's contributions in dispatch order.  Rebuilt every step.
    contributions: Vec<(String, f32)>,

    episode_cumulative: f32,
    episode_totals:     BTreeMap<String, f32>,
    last_step_reward:   f32,
    last_step_valid:    bool,
    invalid_steps:      u64,

    /// Providers already warned about non-finite output this episode.
    warned_non_finite: BTreeSet<String>,
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}

impl RewardCalculator {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            registry:           Registry::new(ProviderKind::Reward),
            config:             config.normalized(),
            contributions:      Vec::new(),
            episode_cumulative: 0.0,
            episode_totals:     BTreeMap::new(),
            last_step_reward:   0.0,
            last_step_valid:    true,
            invalid_steps:      0,
            warned_non_finite:  BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RewardConfig) {
        self.config = config.normalized();
    }

    pub fn registry(&self) -> &Registry<dyn RewardProvider> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn RewardProvider> {
        &mut self.registry
    }

    // ── Registration ──────────────────────────────────────────────────────

    pub fn register(
        &mut self,
        provider: Box<dyn RewardProvider>,
        ctx:      &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(provider, ctx)
    }

    /// Remove `name` and discard everything recorded for it.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn RewardProvider>> {
        let removed = self.registry.unregister(name)?;
        self.contributions.retain(|(n, _)| n != name);
        self.episode_totals.remove(name);
        self.warned_non_finite.remove(name);
        Some(removed)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
    }

    // ── Per-step calculation ──────────────────────────────────────────────

    /// Aggregate this step's reward, apply it to `ctx`, and return it.
    pub fn calculate_step_reward(&mut self, ctx: &mut AgentContext, delta_secs: f32) -> f32 {
        self.contributions.clear();

        let results = {
            let view: &AgentContext = ctx;
            self.registry
                .dispatch("calculate_reward", |p| p.calculate_reward(view, delta_secs))
        };

        let mut total = 0.0_f32;
        let mut saw_non_finite = false;
        for (idx, result) in results {
            let name = self.registry.name_at(idx).unwrap_or_default().to_string();
            let mut value = result.unwrap_or(0.0);
            if !value.is_finite() {
                if self.warned_non_finite.insert(name.clone()) {
                    warn!(agent = %ctx.agent_id(), provider = %name, value, "non-finite reward replaced with 0");
                } else {
                    debug!(provider = %name, value, "non-finite reward replaced with 0");
                }
                value = 0.0;
                saw_non_finite = true;
            }
            total += value;
            *self.episode_totals.entry(name.clone()).or_insert(0.0) += value;
            self.contributions.push((name, value));
        }

        if !total.is_finite() {
            warn!(agent = %ctx.agent_id(), total, "aggregate reward overflowed; step reward set to 0");
            total = 0.0;
            saw_non_finite = true;
        }
        self.last_step_valid = !saw_non_finite;
        if saw_non_finite {
            self.invalid_steps += 1;
        }

        if self.config.clamp_total_reward {
            total = total.clamp(self.config.min_reward_per_step, self.config.max_reward_per_step);
        }

        self.last_step_reward = total;
        self.episode_cumulative += total;
        ctx.add_reward(total);
        total
    }

    /// Deliver a named event to every active provider.  One provider failing
    /// does not stop delivery to the rest.  Returns the number of providers
    /// that handled it successfully.
    pub fn trigger_event(
        &mut self,
        ctx:   &AgentContext,
        name:  &str,
        data:  Option<&dyn std::any::Any>,
    ) -> usize {
        let event = RewardEvent { name, data };
        self.registry
            .dispatch("on_event", |p| p.on_event(ctx, &event))
            .into_iter()
            .filter(|(_, r)| r.is_some())
            .count()
    }

    // ── Episode boundaries ────────────────────────────────────────────────

    pub fn on_episode_begin(&mut self, ctx: &mut AgentContext) {
        self.episode_cumulative = 0.0;
        self.episode_totals.clear();
        self.contributions.clear();
        self.warned_non_finite.clear();
        self.registry.episode_begin(ctx);
    }

    pub fn on_episode_end(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) {
        self.registry.episode_end(ctx, reason);
    }

    pub fn update(&mut self, ctx: &mut AgentContext, delta_secs: f32) {
        self.registry.update(ctx, delta_secs);
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// `(provider, value)` for the most recent step, in dispatch order.
    pub fn last_contributions(&self) -> &[(String, f32)] {
        &self.contributions
    }

    pub fn contribution(&self, name: &str) -> Option<f32> {
        self.contributions.iter().find(|(n, _)| n == name).map(|&(_, v)| v)
    }

    /// Sum of every step reward returned since the episode began.
    pub fn episode_cumulative_reward(&self) -> f32 {
        self.episode_cumulative
    }

    /// Per-provider sums for the current episode.
    pub fn episode_totals(&self) -> &BTreeMap<String, f32> {
        &self.episode_totals
    }

    pub fn last_step_reward(&self) -> f32 {
        self.last_step_reward
    }

    /// `false` if any provider or the aggregate was non-finite on the last
    /// step.
    pub fn last_step_valid(&self) -> bool {
        self.last_step_valid
    }

    pub fn invalid_step_count(&self) -> u64 {
        self.invalid_steps
    }
}
