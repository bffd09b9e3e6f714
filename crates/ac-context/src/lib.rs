//! `ac-context` — the shared per-agent state container.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`context`]   | `AgentContext` — episode/step/reward state and callbacks   |
//! | [`shared`]    | `SharedData` — string-keyed, type-erased value map         |
//! | [`request`]   | `ProviderRequest` — changes deferred until a pass finishes |
//!
//! `AgentContext` is the only mutable state providers share.  There is no
//! locking: every registry dispatches sequentially on the host's fixed-step
//! callback, and the context is handed to one provider at a time.

pub mod context;
pub mod request;
pub mod shared;


pub use context::{AgentContext, EpisodeCallback};
pub use request::ProviderRequest;
pub use shared::SharedData;
