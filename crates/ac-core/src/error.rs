//! Framework error type.
//!
//! Sub-crates define their own error enums for their own boundaries; `AcError`
//! covers configuration problems detected in the core types.

use thiserror::Error;

/// The top-level error type for `ac-core`.
#[derive(Debug, Error)]
pub enum AcError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid action spec: {0}")]
    ActionSpec(String),

    #[error("invalid observation size: {0}")]
    ObservationSize(String),
}

/// Shorthand result type for all `ac-*` crates.
pub type AcResult<T> = Result<T, AcError>;
