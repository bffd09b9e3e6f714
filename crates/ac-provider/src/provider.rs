//! The `Provider` trait — identity and lifecycle shared by every capability.

use ac_context::AgentContext;
use ac_core::EpisodeEndReason;

use crate::ProviderResult;

/// Identity, ordering, and lifecycle hooks common to all providers.
///
/// # Identity
///
/// [`name`](Self::name) defaults to the implementing type's name without its
/// module path.  Registries use it as the provider's identity (duplicates are
/// rejected) and as the tie-breaker when priorities are equal.  Override it
/// when one agent carries two instances of the same type.
///
/// # Ordering
///
/// Registries dispatch in `(priority desc, name asc)` order.  The order is
/// computed when a provider is added or removed, so `priority` should be
/// constant for the lifetime of a registration.
///
/// # Lifecycle
///
/// ```text
/// Uninitialized ──initialize()──▶ Initialized
///                                   │
///        ┌── on_episode_begin() ◀───┤
///        ▼                          │
///   EpisodeActive ── on_episode_end(reason) ──▶ EpisodeInactive
/// ```
///
/// Registries call `initialize` at most once per successful registration.
/// All hooks default to no-ops.
pub trait Provider: 'static {
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Higher runs earlier and dominates in selection.
    fn priority(&self) -> i32 {
        0
    }

    /// Inactive providers stay registered but are skipped by every dispatch.
    fn is_active(&self) -> bool {
        true
    }

    fn initialize(&mut self, _ctx: &mut AgentContext) -> ProviderResult<()> {
        Ok(())
    }

    /// Check configuration and references.  A failing provider is excluded
    /// from dispatch until it validates again.
    fn validate(&self, _ctx: &AgentContext) -> ProviderResult<()> {
        Ok(())
    }

    fn on_episode_begin(&mut self, _ctx: &mut AgentContext) -> ProviderResult<()> {
        Ok(())
    }

    fn on_episode_end(
        &mut self,
        _ctx:    &mut AgentContext,
        _reason: EpisodeEndReason,
    ) -> ProviderResult<()> {
        Ok(())
    }

    /// Per-fixed-update housekeeping.
    fn update(&mut self, _ctx: &mut AgentContext, _delta_secs: f32) -> ProviderResult<()> {
        Ok(())
    }
}

/// Strip the module path (and any generic arguments) from a type name.
///
/// ```rust
/// use ac_provider::short_type_name;
///
/// assert_eq!(short_type_name("game::rewards::GoalReward"), "GoalReward");
/// assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
/// ```
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
