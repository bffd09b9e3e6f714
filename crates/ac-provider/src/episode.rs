//! Episode handlers.

use ac_context::AgentContext;
use ac_core::EpisodeEndReason;

use crate::{Provider, ProviderResult};

/// Decides when episodes start and end.
///
/// Begin/end notifications arrive through [`Provider::on_episode_begin`] and
/// [`Provider::on_episode_end`].
pub trait EpisodeHandler: Provider {
    /// Whether this handler allows a new episode to start now.
    fn should_start_episode(&mut self, _ctx: &AgentContext) -> ProviderResult<bool> {
        Ok(true)
    }

    /// `Some(reason)` to end the current episode.
    fn should_end_episode(&mut self, _ctx: &AgentContext) -> ProviderResult<Option<EpisodeEndReason>> {
        Ok(None)
    }
}
