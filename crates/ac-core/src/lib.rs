//! `ac-core` — foundational types for the `rust_ac` agent composition framework.
//!
//! This crate is a dependency of every other `ac-*` crate.  It has no `ac-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`ids`]       | `EntityHandle`, `ProviderSeq`                             |
//! | [`kind`]      | `ProviderKind` — the seven capability kinds               |
//! | [`episode`]   | `EpisodeEndReason`                                        |
//! | [`time`]      | `Step`, `StepClock`                                       |
//! | [`rng`]       | `AgentRng` (per-agent, seeded from the agent id)          |
//! | [`config`]    | `BehaviorConfig`, `ActionSpec`                            |
//! | [`error`]     | `AcError`, `AcResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod episode;
pub mod error;
pub mod ids;
pub mod kind;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ActionSpec, BehaviorConfig};
pub use episode::EpisodeEndReason;
pub use error::{AcError, AcResult};
pub use ids::{EntityHandle, ProviderSeq};
pub use kind::ProviderKind;
pub use rng::AgentRng;
pub use time::{Step, StepClock};
