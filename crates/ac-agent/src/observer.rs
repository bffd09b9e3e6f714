//! Agent observer trait for telemetry and data collection.

use std::collections::BTreeMap;

use ac_core::Step;

use crate::EpisodeSummary;

/// Callbacks invoked by [`Agent`][crate::Agent] at lifecycle boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — reward printer
///
/// ```rust,ignore
/// struct RewardPrinter;
///
/// impl AgentObserver for RewardPrinter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) {
///         println!("episode {}: {:.2}", summary.episode, summary.cumulative_reward);
///     }
/// }
/// ```
pub trait AgentObserver {
    /// Called after every registry has seen the new episode.
    fn on_episode_begin(&mut self, _agent_id: &str, _episode: u64) {}

    /// Called at the end of every fixed update with that step's reward.
    fn on_step_end(&mut self, _agent_id: &str, _step: Step, _reward: f32) {}

    /// Called with the full current statistics after each collection.
    fn on_statistics(&mut self, _agent_id: &str, _step: Step, _values: &BTreeMap<String, f32>) {}

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}

    /// Called once from `on_destroy`.
    fn on_destroy(&mut self, _agent_id: &str) {}
}

/// An [`AgentObserver`] that does nothing.
pub struct NoopObserver;

impl AgentObserver for NoopObserver {}

/// Fan every callback out to both observers, left first.
impl<A: AgentObserver, B: AgentObserver> AgentObserver for (A, B) {
    fn on_episode_begin(&mut self, agent_id: &str, episode: u64) {
        self.0.on_episode_begin(agent_id, episode);
        self.1.on_episode_begin(agent_id, episode);
    }

    fn on_step_end(&mut self, agent_id: &str, step: Step, reward: f32) {
        self.0.on_step_end(agent_id, step, reward);
        self.1.on_step_end(agent_id, step, reward);
    }

    fn on_statistics(&mut self, agent_id: &str, step: Step, values: &BTreeMap<String, f32>) {
        self.0.on_statistics(agent_id, step, values);
        self.1.on_statistics(agent_id, step, values);
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.0.on_episode_end(summary);
        self.1.on_episode_end(summary);
    }

    fn on_destroy(&mut self, agent_id: &str) {
        self.0.on_destroy(agent_id);
        self.1.on_destroy(agent_id);
    }
}
