//! Error taxonomy shared by every core operation.
//!
//! Each variant maps to one transport-level status class in the HTTP layer;
//! no operation reports a generic failure for a condition covered here, and no
//! operation is retried inside the core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Aggregate or sub-item absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Schema or bounds violation in a request.
    #[error("{0}")]
    Validation(String),

    /// Duplicate friend/request, duplicate participation, or a collection cap
    /// being exceeded.
    #[error("{0}")]
    Conflict(String),

    /// Operation attempted outside its valid state, e.g. a challenge outside
    /// its active window or leaving a challenge never joined.
    #[error("{0}")]
    InvalidState(String),

    /// Caller lacks rights over the target resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(resource: &str) -> Self {
        CoreError::NotFound(resource.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        CoreError::InvalidState(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CoreError::Forbidden(message.into())
    }
}
