use thiserror::Error;

/// Failure reported by a provider callback.
///
/// Registries never propagate these: they log the error with the provider's
/// identity and treat the call as a zero / no-op contribution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider configuration error: {0}")]
    Config(String),

    /// A required target or collaborator reference is not set.
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("provider failed: {0}")]
    Failed(String),

    /// The callback panicked; the registry caught the unwind.
    #[error("provider panicked: {0}")]
    Panicked(String),
}

impl ProviderError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ProviderError::Failed(msg.into())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
