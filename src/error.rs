//! Error types for the planner core

use crate::record::TaskId;

/// Everything that can go wrong while reconciling tasks with a record store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request was rejected before reaching the store (e.g. a schedule ending before it starts).
    /// Nothing has been changed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced task is not (or no longer) in the collection
    #[error("no task with id {0}")]
    NotFound(TaskId),

    /// The persistence layer could not be reached.
    /// The core never retries: this is up to the store adapter or to the caller.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored document cannot be turned into a task
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// (De)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation(message.into())
    }

    pub fn store_unavailable<M: Into<String>>(message: M) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
