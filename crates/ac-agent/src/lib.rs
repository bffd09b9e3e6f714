//! `ac-agent` — the agent composer for the rust_ac framework.
//!
//! An [`Agent`] binds one [`AgentContext`](ac_context::AgentContext) to the
//! seven registries and exposes the lifecycle surface a host engine drives:
//!
//! | Hook                         | When the host calls it                      |
//! |------------------------------|---------------------------------------------|
//! | `initialize()`               | Once, after construction                    |
//! | `on_episode_begin()`         | To force a reset (also automatic)           |
//! | `collect_observations(sink)` | When an external trainer needs observations |
//! | `on_action_received(buf)`    | When an external trainer supplies actions   |
//! | `heuristic(out)`             | In heuristic-only mode                      |
//! | `fixed_update(dt)`           | Every fixed simulation step                 |
//! | `on_destroy()`               | Once, before the host object goes away      |
//!
//! # Modules
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`builder`]   | `AgentBuilder` — explicit composition root               |
//! | [`agent`]     | `Agent`, `StepReport` — lifecycle and fixed-update loop  |
//! | [`observer`]  | `AgentObserver`, `NoopObserver`                          |
//! | [`channel`]   | `SideChannel`, `MemoryChannel`, messages and commands    |
//! | [`providers`] | Random, scripted, and heuristic decision providers       |
//! | [`summary`]   | `EpisodeSummary`                                         |
//! | [`error`]     | `AgentError`, `AgentResult<T>`                           |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ac_agent::{AgentBuilder, RandomDecisionProvider};
//! use ac_core::BehaviorConfig;
//!
//! let mut agent = AgentBuilder::new("agent-0", BehaviorConfig::new("chase"))
//!     .observation(MyObservation)
//!     .action(MyActuator)
//!     .reward(MyReward)
//!     .decision(RandomDecisionProvider::new(42, spec))
//!     .build()?;
//! agent.initialize();
//! for _ in 0..1_000 {
//!     agent.fixed_update(0.02);
//! }
//! agent.on_destroy();
//! ```

pub mod agent;
pub mod builder;
pub mod channel;
pub mod error;
pub mod observer;
pub mod providers;
pub mod summary;


pub use agent::{Agent, StepReport};
pub use builder::AgentBuilder;
pub use channel::{AgentCommand, ChannelMessage, MemoryChannel, SideChannel};
pub use error::{AgentError, AgentResult};
pub use observer::{AgentObserver, NoopObserver};
pub use providers::{
    HEURISTIC_ACTIONS_KEY, HeuristicDecisionProvider, RandomDecisionProvider, ScriptedDecisionProvider,
};
pub use summary::EpisodeSummary;
