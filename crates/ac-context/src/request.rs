//! Requests providers post on the context instead of mutating registries.
//!
//! A provider only ever sees `&AgentContext`/`&mut AgentContext`, never the
//! registry that owns it.  Anything that would change a registry's provider
//! list, or end the episode from inside a dispatch pass, is queued here and
//! applied by the agent composer once the pass has completed.

use ac_core::{EpisodeEndReason, ProviderKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderRequest {
    /// End the current episode with `reason` after the current step.
    EndEpisode(EpisodeEndReason),

    /// Remove the provider named `name` from the `kind` registry.
    Unregister {
        kind: ProviderKind,
        name: String,
    },
}
