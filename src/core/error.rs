use thiserror::Error;
use crate::models::UserId;
use crate::services::StoreError;

/// Errors surfaced by the swipe engine and discovery
#[derive(Debug, Error)]
pub enum EngineError {
    /// The ordered pair was already swiped. Not retried.
    #[error("Swipe already exists between users {actor} and {target}")]
    DuplicateSwipe { actor: UserId, target: UserId },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The unit of work was rolled back before this was returned
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl EngineError {
    pub fn user_not_found(id: UserId) -> Self {
        EngineError::NotFound(format!("user {} does not exist", id))
    }

    /// True for the one storage fault the engine re-runs a transaction on
    pub fn is_serialization_failure(&self) -> bool {
        matches!(self, EngineError::Storage(StoreError::SerializationFailure))
    }
}
