use thiserror::Error;

/// Failure of one command against one instance.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("instance responded with status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("instance directory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("task already exists: {0}")]
    Duplicate(String),

    #[error("task store unavailable: {0}")]
    Unavailable(String),

    /// A persisted record could not be decoded.
    #[error("corrupt task record: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Errors surfaced to callers of the orchestrator.
///
/// Per-instance dispatch failures never show up here; they are logged and
/// folded into the task state instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    DirectoryUnavailable(#[from] DirectoryError),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("invalid workload name {0:?}")]
    InvalidName(String),
}

impl From<StoreError> for OrchestratorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => OrchestratorError::NotFound(id),
            other => OrchestratorError::Store(other),
        }
    }
}

pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;
