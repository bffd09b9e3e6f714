//! The `Agent` composer and its fixed-update loop.

use ac_context::{AgentContext, ProviderRequest};
use ac_core::{BehaviorConfig, EpisodeEndReason, ProviderKind, Step};
use ac_provider::{ActionBuffers, ObservationSink};
use ac_registry::{
    ActionDistributor, DecisionOutcome, DecisionRouter, EpisodeManager, ObservationCollector,
    RewardCalculator, SensorManager, StatisticsCollector,
};
use tracing::{debug, info, warn};

use crate::providers::{HEURISTIC_ACTIONS_KEY, HeuristicDecisionProvider};
use crate::{AgentCommand, AgentObserver, ChannelMessage, EpisodeSummary, SideChannel};

// ── StepReport ────────────────────────────────────────────────────────────────

/// What one [`Agent::fixed_update`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// `false` if no episode was running (and none could start).
    pub stepped:   bool,
    pub step:      Step,
    pub reward:    f32,
    /// `None` on steps that repeated the previous action.
    pub decision:  Option<DecisionOutcome>,
    pub ended:     Option<EpisodeEndReason>,
    /// A new episode began at the end of this step.
    pub restarted: bool,
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// One agent: a context plus the seven registries, driven through the
/// host-facing lifecycle hooks.
///
/// # Fixed update
///
/// ```text
/// ① Commands   — apply AgentCommands received on side channels
/// ② Clock      — reset step reward, advance context clock / step count
/// ③ Sensors    — throttled sensor updates, then Provider::update fan-out
/// ④ Decision   — every `decision_period` steps (or on request): collect
///                observations, route to one decision provider; otherwise
///                repeat the last action.  Distribute to action receivers.
/// ⑤ Reward     — aggregate and apply the step reward
/// ⑥ Episode    — check end conditions; end the episode if any fires
/// ⑦ Restart    — auto-restart when configured and allowed
/// ⑧ Telemetry  — statistics to channels and observer
/// ⑨ Requests   — apply deferred ProviderRequests posted during the step
/// ```
///
/// Create via [`AgentBuilder`][crate::AgentBuilder].
pub struct Agent<O: AgentObserver> {
    pub(crate) config: BehaviorConfig,
    pub(crate) ctx:    AgentContext,

    pub(crate) observations: ObservationCollector,
    pub(crate) actions:      ActionDistributor,
    pub(crate) rewards:      RewardCalculator,
    pub(crate) episodes:     EpisodeManager,
    pub(crate) sensors:      SensorManager,
    pub(crate) decisions:    DecisionRouter,
    pub(crate) statistics:   StatisticsCollector,

    pub(crate) channels: Vec<Box<dyn SideChannel>>,
    pub(crate) observer: O,

    pub(crate) action_buffers:       ActionBuffers,
    pub(crate) statistics_interval:  u64,
    pub(crate) steps_since_decision: u64,
    pub(crate) decision_requested:   bool,
    pub(crate) invalid_at_begin:     u64,
    pub(crate) initialized:          bool,
    pub(crate) destroyed:            bool,
}

impl<O: AgentObserver> Agent<O> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn agent_id(&self) -> &str {
        self.ctx.agent_id()
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AgentContext {
        &mut self.ctx
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn observations(&self) -> &ObservationCollector {
        &self.observations
    }

    pub fn actions(&self) -> &ActionDistributor {
        &self.actions
    }

    pub fn rewards(&self) -> &RewardCalculator {
        &self.rewards
    }

    pub fn episodes(&self) -> &EpisodeManager {
        &self.episodes
    }

    pub fn sensors(&self) -> &SensorManager {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut SensorManager {
        &mut self.sensors
    }

    pub fn decisions(&self) -> &DecisionRouter {
        &self.decisions
    }

    pub fn statistics(&self) -> &StatisticsCollector {
        &self.statistics
    }

    /// The actions most recently decided or received.
    pub fn last_actions(&self) -> &ActionBuffers {
        &self.action_buffers
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ── Lifecycle hooks ───────────────────────────────────────────────────

    /// Initialize every registry once, then begin the first episode if the
    /// episode handlers allow it.  Idempotent.
    pub fn initialize(&mut self) {
        if self.initialized || self.destroyed {
            return;
        }
        self.sensors.initialize(&mut self.ctx);
        self.observations.initialize(&mut self.ctx);
        self.actions.initialize(&mut self.ctx);
        self.rewards.initialize(&mut self.ctx);
        self.episodes.initialize(&mut self.ctx);
        self.decisions.initialize(&mut self.ctx);
        self.statistics.initialize(&mut self.ctx);
        self.initialized = true;

        info!(
            agent = %self.ctx.agent_id(),
            behavior = %self.config.behavior_name,
            observation_size = self.observations.total_size(),
            continuous = self.actions.continuous_action_count(),
            "agent initialized"
        );

        if self.episodes.can_start(&self.ctx) {
            self.on_episode_begin();
        }
    }

    /// Start a new episode.  An episode still running is ended first with
    /// `ManualReset`.
    pub fn on_episode_begin(&mut self) {
        if self.destroyed {
            return;
        }
        if self.ctx.is_episode_active() {
            self.end_episode(EpisodeEndReason::ManualReset);
        }

        self.episodes.begin_episode(&mut self.ctx);
        self.sensors.on_episode_begin(&mut self.ctx);
        self.observations.on_episode_begin(&mut self.ctx);
        self.actions.on_episode_begin(&mut self.ctx);
        self.rewards.on_episode_begin(&mut self.ctx);
        self.decisions.on_episode_begin(&mut self.ctx);
        self.statistics.on_episode_begin(&mut self.ctx);

        self.action_buffers.clear();
        self.steps_since_decision = 0;
        self.decision_requested = false;
        self.invalid_at_begin = self.rewards.invalid_step_count();

        self.observer.on_episode_begin(self.ctx.agent_id(), self.ctx.episode_count());
    }

    /// Append the current observation vector to `sink`.
    pub fn collect_observations(&mut self, sink: &mut ObservationSink) {
        let values = self.observations.collect(&self.ctx);
        sink.add_slice(values);
    }

    /// Actions produced outside the agent (e.g. by an external trainer):
    /// remember them and hand each receiver its segment.
    pub fn on_action_received(&mut self, buffers: &ActionBuffers) -> usize {
        self.action_buffers.clone_from(buffers);
        self.actions.distribute(&mut self.ctx, buffers)
    }

    /// Fill `out` with the receivers' heuristic actions.
    pub fn heuristic(&mut self, out: &mut ActionBuffers) {
        self.actions.heuristic(&self.ctx, out);
        self.ctx.shared_mut().set(HEURISTIC_ACTIONS_KEY, out.clone());
    }

    /// Force a fresh decision on the next fixed update, regardless of the
    /// decision period.
    pub fn request_decision(&mut self) {
        self.decision_requested = true;
    }

    /// Deliver a named reward event to every reward provider.
    pub fn trigger_reward_event(&mut self, name: &str, data: Option<&dyn std::any::Any>) -> usize {
        self.rewards.trigger_event(&self.ctx, name, data)
    }

    /// Advance the agent by one fixed step of `delta_secs`.
    pub fn fixed_update(&mut self, delta_secs: f32) -> StepReport {
        let mut report = StepReport::default();
        if self.destroyed {
            return report;
        }
        if !self.initialized {
            self.initialize();
        }

        // ① Commands
        self.poll_channels();

        if !self.ctx.is_episode_active() {
            let may_start = self.episodes.config().auto_restart || self.ctx.episode_count() == 0;
            if may_start && self.episodes.can_start(&self.ctx) {
                self.on_episode_begin();
            } else {
                self.apply_requests(false);
                return report;
            }
        }

        // ② Clock
        self.ctx.reset_step_reward();
        self.ctx.advance(delta_secs);
        report.stepped = true;
        report.step = self.ctx.clock().current_step;

        // ③ Sensors and per-step housekeeping
        self.sensors.update(&mut self.ctx);
        self.sensors.update_providers(&mut self.ctx, delta_secs);
        self.observations.update(&mut self.ctx, delta_secs);
        self.actions.update(&mut self.ctx, delta_secs);
        self.rewards.update(&mut self.ctx, delta_secs);
        self.episodes.update(&mut self.ctx, delta_secs);
        self.decisions.update(&mut self.ctx, delta_secs);
        self.statistics.update(&mut self.ctx, delta_secs);

        // ④ Decision
        report.decision = self.decide_and_act();

        // ⑤ Reward
        report.reward = self.rewards.calculate_step_reward(&mut self.ctx, delta_secs);
        self.observer.on_step_end(self.ctx.agent_id(), report.step, report.reward);

        // ⑥ Episode
        if let Some(reason) = self.episodes.check_end(&self.ctx) {
            if self.end_episode(reason) {
                report.ended = Some(reason);
            }
        }

        // ⑦ Restart
        if report.ended.is_some() && self.episodes.config().auto_restart && self.episodes.can_start(&self.ctx) {
            self.on_episode_begin();
            report.restarted = true;
        }

        // ⑧ Telemetry
        if self.statistics_interval > 0 && report.step.0 % self.statistics_interval == 0 {
            self.report_statistics(report.step);
        }

        // ⑨ Requests
        self.apply_requests(report.ended.is_some());
        report
    }

    /// End the running episode with `reason`.  Every registry hears about it
    /// before the episode handlers and context do.  Returns `false` if no
    /// episode was running.
    pub fn end_episode(&mut self, reason: EpisodeEndReason) -> bool {
        if !self.ctx.is_episode_active() {
            return false;
        }
        self.sensors.on_episode_end(&mut self.ctx, reason);
        self.observations.on_episode_end(&mut self.ctx, reason);
        self.actions.on_episode_end(&mut self.ctx, reason);
        self.rewards.on_episode_end(&mut self.ctx, reason);
        self.decisions.on_episode_end(&mut self.ctx, reason);
        self.statistics.on_episode_end(&mut self.ctx, reason);

        let summary = EpisodeSummary {
            agent_id:             self.ctx.agent_id().to_string(),
            behavior_name:        self.config.behavior_name.clone(),
            episode:              self.ctx.episode_count(),
            steps:                self.ctx.step_count(),
            cumulative_reward:    self.ctx.cumulative_reward(),
            reason,
            duration_secs:        self.ctx.episode_elapsed_secs(),
            invalid_reward_steps: self.rewards.invalid_step_count() - self.invalid_at_begin,
            reward_breakdown:     self.rewards.episode_totals().clone(),
        };

        if !self.episodes.end_episode(&mut self.ctx, reason) {
            return false;
        }

        self.broadcast(&ChannelMessage::EpisodeEnded(summary.clone()));
        self.observer.on_episode_end(&summary);
        true
    }

    /// Tear down: end any running episode (`ManualReset`) and notify the
    /// observer.  Every later call on the agent is a no-op.
    pub fn on_destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if self.ctx.is_episode_active() {
            self.end_episode(EpisodeEndReason::ManualReset);
        }
        self.observer.on_destroy(self.ctx.agent_id());
        self.destroyed = true;
        info!(agent = %self.ctx.agent_id(), episodes = self.episodes.episodes_completed(), "agent destroyed");
    }

    // ── Commands ──────────────────────────────────────────────────────────

    pub fn apply_command(&mut self, command: AgentCommand) {
        debug!(agent = %self.ctx.agent_id(), ?command, "applying command");
        match command {
            AgentCommand::EndEpisode(reason) => self.episodes.request_end(reason),
            AgentCommand::SetDecisionMode { mode, provider_id } => {
                self.decisions.set_decision_mode(mode, provider_id);
            }
            AgentCommand::SetProviderActive { kind, name, active } => {
                if !self.set_provider_enabled(kind, &name, active) {
                    warn!(agent = %self.ctx.agent_id(), %kind, provider = %name, "no such provider");
                }
            }
        }
    }

    /// Switch a provider on or off in its registry.  Returns `false` if it is
    /// not registered.
    pub fn set_provider_enabled(&mut self, kind: ProviderKind, name: &str, enabled: bool) -> bool {
        match kind {
            ProviderKind::Observation => self.observations.registry_mut().set_enabled(name, enabled),
            ProviderKind::Action      => self.actions.registry_mut().set_enabled(name, enabled),
            ProviderKind::Reward      => self.rewards.registry_mut().set_enabled(name, enabled),
            ProviderKind::Episode     => self.episodes.registry_mut().set_enabled(name, enabled),
            ProviderKind::Sensor      => self.sensors.registry_mut().set_enabled(name, enabled),
            ProviderKind::Decision    => self.decisions.registry_mut().set_enabled(name, enabled),
            ProviderKind::Statistics  => self.statistics.registry_mut().set_enabled(name, enabled),
        }
    }

    /// Remove a provider from its registry.  Returns `false` if it is not
    /// registered.
    pub fn unregister_provider(&mut self, kind: ProviderKind, name: &str) -> bool {
        match kind {
            ProviderKind::Observation => self.observations.unregister(name).is_some(),
            ProviderKind::Action      => self.actions.unregister(name).is_some(),
            ProviderKind::Reward      => self.rewards.unregister(name).is_some(),
            ProviderKind::Episode     => self.episodes.unregister(name).is_some(),
            ProviderKind::Sensor      => self.sensors.unregister(name).is_some(),
            ProviderKind::Decision    => self.decisions.remove_decision_provider(name).is_some(),
            ProviderKind::Statistics  => self.statistics.unregister(name).is_some(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn decide_and_act(&mut self) -> Option<DecisionOutcome> {
        let period = u64::from(self.config.decision_period());
        let due = self.decision_requested || self.steps_since_decision % period == 0;
        self.steps_since_decision += 1;

        if !due {
            self.actions.distribute(&mut self.ctx, &self.action_buffers);
            return None;
        }
        self.decision_requested = false;

        if self.decisions.registry().contains(HeuristicDecisionProvider::NAME) {
            let mut heuristic = ActionBuffers::for_spec(&self.config.action_spec);
            self.actions.heuristic(&self.ctx, &mut heuristic);
            self.ctx.shared_mut().set(HEURISTIC_ACTIONS_KEY, heuristic);
        }

        let observations = self.observations.collect(&self.ctx);
        let outcome = self.decisions.decide_action(&self.ctx, observations, &mut self.action_buffers);
        self.actions.distribute(&mut self.ctx, &self.action_buffers);
        Some(outcome)
    }

    fn poll_channels(&mut self) {
        let mut commands = Vec::new();
        for channel in self.channels.iter_mut() {
            while channel.has_data() {
                match channel.receive() {
                    Some(command) => commands.push(command),
                    None => break,
                }
            }
        }
        for command in commands {
            self.apply_command(command);
        }
    }

    fn broadcast(&mut self, message: &ChannelMessage) {
        for channel in self.channels.iter_mut() {
            if let Err(error) = channel.send(message) {
                warn!(agent = %self.ctx.agent_id(), channel = %channel.name(), %error, "side channel send failed");
            }
        }
    }

    fn report_statistics(&mut self, step: Step) {
        if self.statistics.collect(&self.ctx) == 0 {
            return;
        }
        self.observer.on_statistics(self.ctx.agent_id(), step, self.statistics.all_current());
        let changed = self.statistics.changed_since_last();
        if !changed.is_empty() {
            self.broadcast(&ChannelMessage::Statistics {
                agent_id: self.ctx.agent_id().to_string(),
                step:     step.0,
                values:   changed,
            });
        }
    }

    /// Apply requests posted on the context during the step.  End requests
    /// are dropped when an episode already ended this step.
    fn apply_requests(&mut self, ended_this_step: bool) {
        for request in self.ctx.take_requests() {
            match request {
                ProviderRequest::EndEpisode(reason) => {
                    if !ended_this_step {
                        self.episodes.request_end(reason);
                    }
                }
                ProviderRequest::Unregister { kind, name } => {
                    if !self.unregister_provider(kind, &name) {
                        warn!(agent = %self.ctx.agent_id(), %kind, provider = %name, "unregister request for unknown provider");
                    }
                }
            }
        }
    }
}
