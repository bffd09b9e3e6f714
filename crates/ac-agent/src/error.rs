use ac_core::AcError;
use ac_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Behavior(#[from] AcError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("side channel '{channel}' failed: {message}")]
    Channel {
        channel: String,
        message: String,
    },
}

pub type AgentResult<T> = Result<T, AgentError>;
