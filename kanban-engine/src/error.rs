//! Error types for the kanban engine
//!
//! Domain operations report outcomes through return values (`bool`, counts,
//! [`MoveResult`](crate::MoveResult)). `KanbanError` covers the persistence
//! and configuration boundary only.

use thiserror::Error;

/// Result type for kanban persistence and configuration operations
pub type Result<T> = std::result::Result<T, KanbanError>;

/// Errors that can occur at the storage and configuration boundary
#[derive(Debug, Error)]
pub enum KanbanError {
    /// Task not found
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// Column not found
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Lane not found
    #[error("lane not found: {id}")]
    LaneNotFound { id: String },

    /// Board not found in the store
    #[error("board not found: {id}")]
    BoardNotFound { id: String },

    /// Id cannot be used as a storage key
    #[error("invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// Invalid value for a field
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// No store configured for the requested operation
    #[error("no {store} configured")]
    StoreUnavailable { store: String },

    /// Another writer holds the board lock
    #[error("board is locked by another writer")]
    LockBusy,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl KanbanError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid id error
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a store-unavailable error
    pub fn store_unavailable(store: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store: store.into(),
        }
    }

    /// True for the not-found family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound { .. }
                | Self::ColumnNotFound { .. }
                | Self::LaneNotFound { .. }
                | Self::BoardNotFound { .. }
        )
    }
}

impl From<figment::Error> for KanbanError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
