use ac_core::ProviderKind;
use thiserror::Error;

/// Registration failures.  Dispatch itself never fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} provider '{name}' is already registered")]
    Duplicate {
        kind: ProviderKind,
        name: String,
    },

    #[error("{kind} provider '{name}' is not registered")]
    NotFound {
        kind: ProviderKind,
        name: String,
    },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
