//! Fluent builder — the agent's composition root.

use ac_context::AgentContext;
use ac_core::{BehaviorConfig, EntityHandle};
use ac_provider::{
    ActionBuffers, ActionReceiver, DecisionProvider, EpisodeHandler, ObservationProvider,
    RewardProvider, SensorProvider, StatisticsProvider,
};
use ac_registry::{
    ActionDistributor, DecisionConfig, DecisionRouter, EpisodeConfig, EpisodeManager,
    ObservationCollector, RewardCalculator, RewardConfig, SensorConfig, SensorManager,
    StatisticsCollector,
};
use tracing::warn;

use crate::{Agent, AgentError, AgentObserver, AgentResult, NoopObserver, SideChannel};

/// Fluent builder for [`Agent<O>`].
///
/// Every provider instance is handed over explicitly; nothing is discovered
/// at runtime.  Registration order is the final tie-breaker after
/// `(priority desc, name asc)`, and the first decision provider added is the
/// router's default unless [`DecisionConfig::default_provider_id`] says
/// otherwise.
///
/// # Optional inputs (have defaults)
///
/// | Method                      | Default                                      |
/// |-----------------------------|----------------------------------------------|
/// | `.owner(h)`                 | `EntityHandle::INVALID`                      |
/// | `.reward_config(c)`         | No clamping                                  |
/// | `.episode_config(c)`        | `max_steps` from the behavior, auto-restart  |
/// | `.sensor_config(c)`         | 0.1 s interval, no slicing, no LOD           |
/// | `.decision_config(c)`       | `Auto` mode, first provider as default       |
/// | `.statistics_interval(n)`   | Every step                                   |
/// | `.observer(o)`              | [`NoopObserver`]                             |
///
/// # Example
///
/// ```rust,ignore
/// let mut agent = AgentBuilder::new("chaser-0", behavior)
///     .observation(RelativePosition::default())
///     .action(Mover::default())
///     .reward(DistanceReward::new(0.1))
///     .episode_handler(CatchHandler::default())
///     .decision(RandomDecisionProvider::new(7, spec))
///     .build()?;
/// agent.initialize();
/// ```
pub struct AgentBuilder<O: AgentObserver = NoopObserver> {
    agent_id:            String,
    owner:               EntityHandle,
    behavior:            BehaviorConfig,
    reward_config:       RewardConfig,
    episode_config:      Option<EpisodeConfig>,
    sensor_config:       SensorConfig,
    decision_config:     DecisionConfig,
    statistics_interval: u64,

    observations: Vec<Box<dyn ObservationProvider>>,
    actions:      Vec<Box<dyn ActionReceiver>>,
    rewards:      Vec<Box<dyn RewardProvider>>,
    episodes:     Vec<Box<dyn EpisodeHandler>>,
    sensors:      Vec<Box<dyn SensorProvider>>,
    decisions:    Vec<Box<dyn DecisionProvider>>,
    statistics:   Vec<Box<dyn StatisticsProvider>>,
    channels:     Vec<Box<dyn SideChannel>>,
    observer:     O,
}

impl AgentBuilder<NoopObserver> {
    pub fn new(agent_id: impl Into<String>, behavior: BehaviorConfig) -> Self {
        Self {
            agent_id:            agent_id.into(),
            owner:               EntityHandle::INVALID,
            behavior,
            reward_config:       RewardConfig::default(),
            episode_config:      None,
            sensor_config:       SensorConfig::default(),
            decision_config:     DecisionConfig::default(),
            statistics_interval: 1,
            observations:        Vec::new(),
            actions:             Vec::new(),
            rewards:             Vec::new(),
            episodes:            Vec::new(),
            sensors:             Vec::new(),
            decisions:           Vec::new(),
            statistics:          Vec::new(),
            channels:            Vec::new(),
            observer:            NoopObserver,
        }
    }
}

impl<O: AgentObserver> AgentBuilder<O> {
    pub fn owner(mut self, owner: EntityHandle) -> Self {
        self.owner = owner;
        self
    }

    pub fn reward_config(mut self, config: RewardConfig) -> Self {
        self.reward_config = config;
        self
    }

    pub fn episode_config(mut self, config: EpisodeConfig) -> Self {
        self.episode_config = Some(config);
        self
    }

    pub fn sensor_config(mut self, config: SensorConfig) -> Self {
        self.sensor_config = config;
        self
    }

    pub fn decision_config(mut self, config: DecisionConfig) -> Self {
        self.decision_config = config;
        self
    }

    /// Collect statistics every `n` steps.  `0` disables collection.
    pub fn statistics_interval(mut self, n: u64) -> Self {
        self.statistics_interval = n;
        self
    }

    // ── Providers ─────────────────────────────────────────────────────────

    pub fn observation(mut self, provider: impl ObservationProvider) -> Self {
        self.observations.push(Box::new(provider));
        self
    }

    pub fn action(mut self, receiver: impl ActionReceiver) -> Self {
        self.actions.push(Box::new(receiver));
        self
    }

    pub fn reward(mut self, provider: impl RewardProvider) -> Self {
        self.rewards.push(Box::new(provider));
        self
    }

    pub fn episode_handler(mut self, handler: impl EpisodeHandler) -> Self {
        self.episodes.push(Box::new(handler));
        self
    }

    pub fn sensor(mut self, sensor: impl SensorProvider) -> Self {
        self.sensors.push(Box::new(sensor));
        self
    }

    pub fn decision(mut self, provider: impl DecisionProvider) -> Self {
        self.decisions.push(Box::new(provider));
        self
    }

    pub fn statistics(mut self, provider: impl StatisticsProvider) -> Self {
        self.statistics.push(Box::new(provider));
        self
    }

    pub fn side_channel(mut self, channel: impl SideChannel + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    /// Replace the observer.  Combine several with a tuple: `.observer((a, b))`.
    pub fn observer<O2: AgentObserver>(self, observer: O2) -> AgentBuilder<O2> {
        AgentBuilder {
            agent_id:            self.agent_id,
            owner:               self.owner,
            behavior:            self.behavior,
            reward_config:       self.reward_config,
            episode_config:      self.episode_config,
            sensor_config:       self.sensor_config,
            decision_config:     self.decision_config,
            statistics_interval: self.statistics_interval,
            observations:        self.observations,
            actions:             self.actions,
            rewards:             self.rewards,
            episodes:            self.episodes,
            sensors:             self.sensors,
            decisions:           self.decisions,
            statistics:          self.statistics,
            channels:            self.channels,
            observer,
        }
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Register every provider, reconcile the behavior config with what the
    /// providers declare, and return an uninitialized [`Agent`].
    ///
    /// Fails on an empty agent id, duplicate provider names within one
    /// capability, or a behavior config that is invalid once the action
    /// space has been filled in from the receivers.
    pub fn build(self) -> AgentResult<Agent<O>> {
        if self.agent_id.trim().is_empty() {
            return Err(AgentError::Config("agent id must not be empty".into()));
        }

        let mut ctx = AgentContext::new(self.agent_id).with_owner(self.owner);
        let mut behavior = self.behavior;

        // ── Registries ────────────────────────────────────────────────────
        let mut observations = ObservationCollector::new();
        for p in self.observations {
            observations.register(p, &mut ctx)?;
        }
        let mut actions = ActionDistributor::new();
        for r in self.actions {
            actions.register(r, &mut ctx)?;
        }
        let mut rewards = RewardCalculator::new(self.reward_config);
        for p in self.rewards {
            rewards.register(p, &mut ctx)?;
        }
        let episode_config = self.episode_config.unwrap_or(EpisodeConfig {
            max_steps: behavior.max_steps,
            ..EpisodeConfig::default()
        });
        let mut episodes = EpisodeManager::new(episode_config);
        for h in self.episodes {
            episodes.register(h, &mut ctx)?;
        }
        let mut sensors = SensorManager::new(self.sensor_config);
        for s in self.sensors {
            sensors.register(s, &mut ctx)?;
        }
        let mut decisions = DecisionRouter::new(self.decision_config);
        for p in self.decisions {
            decisions.add_decision_provider(p, &mut ctx)?;
        }
        let mut statistics = StatisticsCollector::new();
        for p in self.statistics {
            statistics.register(p, &mut ctx)?;
        }

        // ── Reconcile declared sizes ──────────────────────────────────────
        let declared_obs = observations.total_size();
        if behavior.observation_size == 0 {
            behavior.observation_size = declared_obs;
        } else if behavior.observation_size != declared_obs {
            warn!(
                agent = %ctx.agent_id(),
                configured = behavior.observation_size,
                providers = declared_obs,
                "observation size does not match providers"
            );
        }

        let declared_actions = actions.action_spec();
        if behavior.action_spec.is_empty() {
            behavior.action_spec = declared_actions;
        } else if behavior.action_spec != declared_actions {
            warn!(
                agent = %ctx.agent_id(),
                configured = ?behavior.action_spec,
                receivers = ?declared_actions,
                "action spec does not match receivers"
            );
        }
        behavior.validate()?;

        let action_buffers = ActionBuffers::for_spec(&behavior.action_spec);

        Ok(Agent {
            config:               behavior,
            ctx,
            observations,
            actions,
            rewards,
            episodes,
            sensors,
            decisions,
            statistics,
            channels:             self.channels,
            observer:             self.observer,
            action_buffers,
            statistics_interval:  self.statistics_interval,
            steps_since_decision: 0,
            decision_requested:   false,
            invalid_at_begin:     0,
            initialized:          false,
            destroyed:            false,
        })
    }
}
