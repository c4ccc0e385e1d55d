//! Session and storage error types.

use std::sync::Arc;

use thiserror::Error;

use crate::event::LifecycleEvent;

/// Boxed error returned by lifecycle listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Session and storage operation errors.
#[derive(Error, Debug, Clone)]
pub enum OrmError {
    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Table already exists
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Row not found
    #[error("Row {id} not found in table '{table}'")]
    RowNotFound { table: String, id: u64 },

    /// Row id already taken
    #[error("Duplicate id {id} in table '{table}'")]
    DuplicateId { table: String, id: u64 },

    /// Unique column constraint violated
    #[error("Unique constraint on '{table}.{column}' violated by value {value}")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },

    /// Column missing from a row
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Type mismatch error
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// Stored row could not be turned into an entity (or back)
    #[error("Hydration of '{table}' failed: {message}")]
    Hydration { table: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error raised by a lifecycle listener
    #[error("{event} listener failed: {source}")]
    Listener {
        event: LifecycleEvent,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl OrmError {
    /// Wraps an error returned by a listener for `event`.
    pub fn listener(event: LifecycleEvent, source: ListenerError) -> Self {
        OrmError::Listener {
            event,
            source: Arc::from(source),
        }
    }

    /// Returns the listener's own error when it is of type `E`.
    pub fn listener_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            OrmError::Listener { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
