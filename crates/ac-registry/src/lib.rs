//! `ac-registry` — ordered provider registries and the seven coordinators.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`registry`]    | `Registry<P>` — ordering, lifecycle, isolated dispatch        |
//! | [`observation`] | `ObservationCollector` — fixed-layout concatenation           |
//! | [`action`]      | `ActionDistributor`, `ActionSlot` — buffer slicing            |
//! | [`reward`]      | `RewardCalculator`, `RewardConfig` — aggregation and clamping |
//! | [`episode`]     | `EpisodeManager`, `EpisodeConfig` — start/end conditions      |
//! | [`sensor`]      | `SensorManager`, `SensorConfig` — throttling, LOD, cache      |
//! | [`decision`]    | `DecisionRouter`, `DecisionMode`, `DecisionOutcome`           |
//! | [`statistics`]  | `StatisticsCollector` — current and changed views             |
//! | [`error`]       | `RegistryError`, `RegistryResult<T>`                          |
//!
//! # Shared shape
//!
//! Every coordinator wraps one `Registry<dyn Capability>` and follows the
//! same cycle: register → sort by `(priority desc, name asc)` → initialize
//! once → dispatch per step.  Only the payload differs.
//!
//! Registries never own the [`AgentContext`](ac_context::AgentContext); each
//! call borrows it.  No provider error or panic escapes a registry call.

pub mod action;
pub mod decision;
pub mod episode;
pub mod error;
pub mod observation;
pub mod registry;
pub mod reward;
pub mod sensor;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use action::{ActionDistributor, ActionSlot};
pub use decision::{DecisionConfig, DecisionMode, DecisionOutcome, DecisionRouter};
pub use episode::{EpisodeConfig, EpisodeManager};
pub use error::{RegistryError, RegistryResult};
pub use observation::ObservationCollector;
pub use registry::{InitState, Registry};
pub use reward::{RewardCalculator, RewardConfig};
pub use sensor::{SensorConfig, SensorManager};
pub use statistics::StatisticsCollector;
