//! Per-episode summary handed to observers and side channels.

use std::collections::BTreeMap;

use ac_core::EpisodeEndReason;

/// Everything worth recording about one finished episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    pub agent_id:          String,
    pub behavior_name:     String,
    pub episode:           u64,
    pub steps:             u64,
    pub cumulative_reward: f32,
    pub reason:            EpisodeEndReason,
    pub duration_secs:     f64,
    /// Steps whose aggregate reward was non-finite and zeroed.
    pub invalid_reward_steps: u64,
    /// Per-reward-provider totals for the episode.
    pub reward_breakdown:  BTreeMap<String, f32>,
}
