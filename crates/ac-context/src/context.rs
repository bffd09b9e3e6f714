//! `AgentContext` — the state every provider reads and writes through.

use std::fmt;

use ac_core::{EntityHandle, EpisodeEndReason, ProviderKind, Step, StepClock};
use tracing::{debug, warn};

use crate::{ProviderRequest, SharedData};

/// A zero-argument callback fired at an episode boundary.
pub type EpisodeCallback = Box<dyn FnMut()>;

/// Per-agent shared state.
///
/// Owned by exactly one agent; created when the agent is built and dropped
/// with it.  Registries borrow it for the duration of one dispatch call and
/// never store it.
///
/// # Reward invariant
///
/// `cumulative_reward` always equals the sum of every [`add_reward`] since the
/// later of the last [`begin_episode`] and the last [`set_reward`].
///
/// [`add_reward`]: AgentContext::add_reward
/// [`set_reward`]: AgentContext::set_reward
/// [`begin_episode`]: AgentContext::begin_episode
pub struct AgentContext {
    agent_id: String,
    owner:    EntityHandle,

    clock: StepClock,

    // ── Episode state ─────────────────────────────────────────────────────
    episode_count:      u64,
    episode_active:     bool,
    episode_start_secs: f64,
    episode_start_step: Step,
    step_count:         u64,
    last_end_reason:    Option<EpisodeEndReason>,

    // ── Reward state ──────────────────────────────────────────────────────
    cumulative_reward: f32,
    step_reward:       f32,

    shared: SharedData,

    begin_callbacks: Vec<EpisodeCallback>,
    end_callbacks:   Vec<EpisodeCallback>,

    requests: Vec<ProviderRequest>,
}

impl AgentContext {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id:           agent_id.into(),
            owner:              EntityHandle::INVALID,
            clock:              StepClock::new(),
            episode_count:      0,
            episode_active:     false,
            episode_start_secs: 0.0,
            episode_start_step: Step::ZERO,
            step_count:         0,
            last_end_reason:    None,
            cumulative_reward:  0.0,
            step_reward:        0.0,
            shared:             SharedData::new(),
            begin_callbacks:    Vec::new(),
            end_callbacks:      Vec::new(),
            requests:           Vec::new(),
        }
    }

    /// Attach the host object that owns this agent.
    pub fn with_owner(mut self, owner: EntityHandle) -> Self {
        self.owner = owner;
        self
    }

    // ── Identity ──────────────────────────────────────────────────────────

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn owner(&self) -> EntityHandle {
        self.owner
    }

    // ── Time ──────────────────────────────────────────────────────────────

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    /// Simulated seconds since the agent was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed_secs
    }

    /// Advance the clock by one fixed update.  Counts a step only while an
    /// episode is active.
    pub fn advance(&mut self, delta_secs: f32) {
        self.clock.advance(delta_secs);
        if self.episode_active {
            self.step_count += 1;
        }
    }

    // ── Episode state ─────────────────────────────────────────────────────

    pub fn episode_count(&self) -> u64 {
        self.episode_count
    }

    pub fn is_episode_active(&self) -> bool {
        self.episode_active
    }

    /// Steps taken in the current (or most recent) episode.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// `elapsed_secs` reading when the current episode began.
    pub fn episode_start_secs(&self) -> f64 {
        self.episode_start_secs
    }

    pub fn episode_start_step(&self) -> Step {
        self.episode_start_step
    }

    /// Simulated seconds since the current episode began.
    pub fn episode_elapsed_secs(&self) -> f64 {
        self.clock.secs_since(self.episode_start_secs)
    }

    pub fn last_end_reason(&self) -> Option<EpisodeEndReason> {
        self.last_end_reason
    }

    /// Start a new episode: bump the counter, reset step count and rewards,
    /// then fire every episode-begin callback in registration order.
    pub fn begin_episode(&mut self) {
        self.episode_count += 1;
        self.episode_active = true;
        self.episode_start_secs = self.clock.elapsed_secs;
        self.episode_start_step = self.clock.current_step;
        self.step_count = 0;
        self.cumulative_reward = 0.0;
        self.step_reward = 0.0;
        debug!(agent = %self.agent_id, episode = self.episode_count, "episode begin");
        for cb in self.begin_callbacks.iter_mut() {
            cb();
        }
    }

    /// End the active episode and fire every episode-end callback.
    ///
    /// Returns `false` (and fires nothing) if no episode is active.
    pub fn end_episode(&mut self, reason: EpisodeEndReason) -> bool {
        if !self.episode_active {
            return false;
        }
        self.episode_active = false;
        self.last_end_reason = Some(reason);
        debug!(
            agent = %self.agent_id,
            episode = self.episode_count,
            steps = self.step_count,
            reward = self.cumulative_reward,
            %reason,
            "episode end"
        );
        for cb in self.end_callbacks.iter_mut() {
            cb();
        }
        true
    }

    // ── Reward state ──────────────────────────────────────────────────────

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    /// Reward accumulated during the current step.
    pub fn step_reward(&self) -> f32 {
        self.step_reward
    }

    /// Add `reward` to both the step and cumulative totals.
    ///
    /// Non-finite values are dropped with a warning; they never reach the
    /// totals.
    pub fn add_reward(&mut self, reward: f32) {
        if !reward.is_finite() {
            warn!(agent = %self.agent_id, reward, "dropping non-finite reward");
            return;
        }
        self.step_reward += reward;
        self.cumulative_reward += reward;
    }

    /// Replace the reward: the step reward becomes `reward` and the cumulative
    /// total restarts from it.
    pub fn set_reward(&mut self, reward: f32) {
        if !reward.is_finite() {
            warn!(agent = %self.agent_id, reward, "dropping non-finite reward");
            return;
        }
        self.step_reward = reward;
        self.cumulative_reward = reward;
    }

    /// Zero the per-step reward.  Called by the composer at the start of each
    /// fixed update.
    pub fn reset_step_reward(&mut self) {
        self.step_reward = 0.0;
    }

    // ── Shared data ───────────────────────────────────────────────────────

    pub fn shared(&self) -> &SharedData {
        &self.shared
    }

    pub fn shared_mut(&mut self) -> &mut SharedData {
        &mut self.shared
    }

    // ── Callbacks ─────────────────────────────────────────────────────────

    /// Register a callback fired on every episode begin.  Callbacks are never
    /// removed automatically.
    pub fn on_episode_begin(&mut self, callback: impl FnMut() + 'static) {
        self.begin_callbacks.push(Box::new(callback));
    }

    /// Register a callback fired on every episode end.
    pub fn on_episode_end(&mut self, callback: impl FnMut() + 'static) {
        self.end_callbacks.push(Box::new(callback));
    }

    pub fn episode_begin_callback_count(&self) -> usize {
        self.begin_callbacks.len()
    }

    pub fn episode_end_callback_count(&self) -> usize {
        self.end_callbacks.len()
    }

    // ── Deferred requests ─────────────────────────────────────────────────

    /// Ask for the episode to end once the current step completes.
    pub fn request_episode_end(&mut self, reason: EpisodeEndReason) {
        self.requests.push(ProviderRequest::EndEpisode(reason));
    }

    /// Ask for a provider to be removed once the current pass completes.
    pub fn request_unregister(&mut self, kind: ProviderKind, name: impl Into<String>) {
        self.requests.push(ProviderRequest::Unregister { kind, name: name.into() });
    }

    /// The first pending episode-end request, if any, without consuming it.
    pub fn pending_episode_end(&self) -> Option<EpisodeEndReason> {
        self.requests.iter().find_map(|r| match r {
            ProviderRequest::EndEpisode(reason) => Some(*reason),
            ProviderRequest::Unregister { .. } => None,
        })
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Drain all pending requests in the order they were posted.
    pub fn take_requests(&mut self) -> Vec<ProviderRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentContext")
            .field("agent_id", &self.agent_id)
            .field("owner", &self.owner)
            .field("clock", &self.clock)
            .field("episode_count", &self.episode_count)
            .field("episode_active", &self.episode_active)
            .field("step_count", &self.step_count)
            .field("cumulative_reward", &self.cumulative_reward)
            .field("shared_keys", &self.shared.len())
            .finish()
    }
}
