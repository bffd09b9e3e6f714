//! Placeholder providers.

use ac_context::AgentContext;

use crate::{ActionBuffers, DecisionProvider, Provider, ProviderResult, RewardProvider};

/// A [`DecisionProvider`] that never opts in and, if chosen as the fallback,
/// leaves the buffers zeroed.
///
/// Useful as the router's default for agents that should idle when nothing
/// else wants control.
pub struct NoopDecision;

impl Provider for NoopDecision {
    fn priority(&self) -> i32 {
        i32::MIN
    }
}

impl DecisionProvider for NoopDecision {
    fn should_decide(&mut self, _ctx: &AgentContext, _observations: &[f32]) -> ProviderResult<bool> {
        Ok(false)
    }

    fn decide_action(
        &mut self,
        _ctx:          &AgentContext,
        _observations: &[f32],
        actions:       &mut ActionBuffers,
    ) -> ProviderResult<()> {
        actions.clear();
        Ok(())
    }
}

/// A [`RewardProvider`] that always contributes `0.0`.
pub struct NoopReward;

impl Provider for NoopReward {}

impl RewardProvider for NoopReward {
    fn calculate_reward(&mut self, _ctx: &AgentContext, _delta_secs: f32) -> ProviderResult<f32> {
        Ok(0.0)
    }
}
