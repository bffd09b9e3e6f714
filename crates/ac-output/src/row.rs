//! Plain data row types written by output backends.

use ac_agent::EpisodeSummary;

/// One finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummaryRow {
    pub agent_id:             String,
    pub behavior_name:        String,
    pub episode:              u64,
    pub steps:                u64,
    pub cumulative_reward:    f32,
    /// `EpisodeEndReason` in snake_case (`success`, `max_steps_reached`, …).
    pub reason:               String,
    pub duration_secs:        f64,
    pub invalid_reward_steps: u64,
}

impl From<&EpisodeSummary> for EpisodeSummaryRow {
    fn from(s: &EpisodeSummary) -> Self {
        Self {
            agent_id:             s.agent_id.clone(),
            behavior_name:        s.behavior_name.clone(),
            episode:              s.episode,
            steps:                s.steps,
            cumulative_reward:    s.cumulative_reward,
            reason:               s.reason.to_string(),
            duration_secs:        s.duration_secs,
            invalid_reward_steps: s.invalid_reward_steps,
        }
    }
}

/// One `provider/metric` value at a given step.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticRow {
    pub agent_id: String,
    pub step:     u64,
    pub key:      String,
    pub value:    f32,
}
