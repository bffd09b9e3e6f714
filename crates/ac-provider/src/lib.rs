//! `ac-provider` — the capability interfaces every pluggable unit implements.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`provider`]    | `Provider` — identity, priority, active flag, lifecycle      |
//! | [`observation`] | `ObservationProvider`, `ObservationSink`                     |
//! | [`action`]      | `ActionReceiver`, `ActionBuffers`, `ActionSegment(Mut)`      |
//! | [`reward`]      | `RewardProvider`, `RewardEvent`                              |
//! | [`episode`]     | `EpisodeHandler`                                             |
//! | [`sensor`]      | `SensorProvider`, `SensorFrame`, `SensorKind`, `LodLevel`    |
//! | [`cache`]       | `SensorCache` — short-TTL store for derived sensor data      |
//! | [`decision`]    | `DecisionProvider`                                           |
//! | [`statistics`]  | `StatisticsProvider`                                         |
//! | [`helpers`]     | Bounds-checked buffer access and numeric sanitising          |
//! | [`noop`]        | `NoopDecision`, `NoopReward`                                 |
//! | [`error`]       | `ProviderError`, `ProviderResult<T>`                         |
//!
//! # Design notes
//!
//! There is no base class.  Every capability trait has `Provider` as its only
//! supertrait, and `Provider`'s lifecycle hooks all default to no-ops, so a
//! provider implements exactly the operations it cares about.  Shared
//! behavior that would otherwise live in a base class is a free function in
//! [`helpers`].
//!
//! Providers never see the registry that owns them.  All they receive is the
//! [`AgentContext`][ac_context::AgentContext]; structural changes go through
//! its deferred-request queue.

pub mod action;
pub mod cache;
pub mod decision;
pub mod episode;
pub mod error;
pub mod helpers;
pub mod noop;
pub mod observation;
pub mod provider;
pub mod reward;
pub mod sensor;
pub mod statistics;


pub use action::{ActionBuffers, ActionReceiver, ActionSegment, ActionSegmentMut};
pub use decision::DecisionProvider;
pub use episode::EpisodeHandler;
pub use error::{ProviderError, ProviderResult};
pub use noop::{NoopDecision, NoopReward};
pub use observation::{ObservationProvider, ObservationSink};
pub use provider::{Provider, short_type_name};
pub use reward::{RewardEvent, RewardProvider};
pub use cache::SensorCache;
pub use sensor::{LodLevel, SensorFrame, SensorKind, SensorProvider};
pub use statistics::StatisticsProvider;
