//! Reward providers.

use std::any::Any;

use ac_context::AgentContext;

use crate::{Provider, ProviderResult};

/// A named event fanned out to every active reward provider
/// (e.g. `"GoalReached"`), with optional payload.
#[derive(Clone, Copy)]
pub struct RewardEvent<'a> {
    pub name: &'a str,
    pub data: Option<&'a dyn Any>,
}

impl<'a> RewardEvent<'a> {
    pub fn new(name: &'a str) -> Self {
        Self { name, data: None }
    }

    pub fn with_data(name: &'a str, data: &'a dyn Any) -> Self {
        Self { name, data: Some(data) }
    }

    /// Payload downcast to `T`, if present and of that type.
    pub fn payload<T: 'static>(&self) -> Option<&'a T> {
        self.data.and_then(|d| d.downcast_ref::<T>())
    }
}

/// Contributes one term of the per-step reward.
///
/// The value returned from [`calculate_reward`](Self::calculate_reward) must
/// already include the provider's own [`weight`](Self::weight); the
/// calculator sums results without re-weighting.
pub trait RewardProvider: Provider {
    /// Informational; the provider applies it itself.
    fn weight(&self) -> f32 {
        1.0
    }

    fn calculate_reward(&mut self, ctx: &AgentContext, delta_secs: f32) -> ProviderResult<f32>;

    fn on_event(&mut self, _ctx: &AgentContext, _event: &RewardEvent<'_>) -> ProviderResult<()> {
        Ok(())
    }
}
