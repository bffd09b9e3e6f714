//! Decision providers — competing sources of the agent's actions.

use ac_context::AgentContext;

use crate::{ActionBuffers, Provider, ProviderResult};

/// One candidate controller (trained-model inference, keyboard heuristic,
/// scripted behavior, …).  The decision router picks exactly one per step.
pub trait DecisionProvider: Provider {
    /// Opt in to deciding this step.
    fn should_decide(&mut self, ctx: &AgentContext, observations: &[f32]) -> ProviderResult<bool>;

    /// Write the step's actions into `actions`.
    fn decide_action(
        &mut self,
        ctx:          &AgentContext,
        observations: &[f32],
        actions:      &mut ActionBuffers,
    ) -> ProviderResult<()>;
}
