use super::store::{AssetError, StoreError};

/// Failure taxonomy shared by the application and payment workflows.
///
/// `Conflict` is recoverable: the caller re-fetches current state and retries
/// the intended action if it still applies. `Internal` never carries storage
/// internals to the client; the detail is logged at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict => Self::Conflict("record already exists".to_string()),
            StoreError::NotFound => Self::NotFound("record not found".to_string()),
            StoreError::Unavailable(detail) => Self::Internal(detail),
        }
    }
}

impl From<AssetError> for WorkflowError {
    fn from(value: AssetError) -> Self {
        match value {
            AssetError::Transport(detail) => Self::Internal(detail),
        }
    }
}
