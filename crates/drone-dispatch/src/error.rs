//! Dispatch engine error types

use thiserror::Error;

use drone_domain::DomainError;
use drone_persistence::PersistenceError;

/// Reason reported when no drone satisfies an order's constraints
pub const NO_ELIGIBLE_DRONE: &str = "no eligible drone";

/// Dispatch engine errors.
///
/// `NotFound`, `InvalidState` and `Infeasible` are expected business
/// outcomes. `Store` signals a fault in the entity store itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Infeasible: {0}")]
    Infeasible(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl DispatchError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible(reason.into())
    }

    /// Human-readable reason without the kind prefix
    pub fn reason(&self) -> String {
        match self {
            Self::NotFound { .. } => self.to_string(),
            Self::InvalidState(r) | Self::Infeasible(r) | Self::Validation(r) | Self::Store(r) => {
                r.clone()
            }
        }
    }

    /// Whether this error should abort a batch instead of being collected
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<PersistenceError> for DispatchError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity_type, key } => Self::NotFound {
                entity_type,
                id: key,
            },
            PersistenceError::WriteConflict(msg) => Self::Store(msg),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { .. } => Self::Validation(err.to_string()),
            DomainError::InvalidTransition { .. } => Self::InvalidState(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
