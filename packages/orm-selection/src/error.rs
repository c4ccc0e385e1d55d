//! Resolution error types.

use orm_core::OrmError;
use thiserror::Error;

/// Errors raised while resolving or seeding selections.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// Payload is not a list of `{"field": int, "choiceList": [int]}` objects
    #[error("Malformed selection payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload references a field missing from the catalog
    #[error("Selection references unknown field {field}")]
    UnknownField { field: u64 },

    /// Column value longer than its declared length
    #[error("Value for '{table}.{column}' is {actual} characters, limit is {max}")]
    ValueTooLong {
        table: &'static str,
        column: &'static str,
        max: usize,
        actual: usize,
    },

    /// Fixture document could not be read
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// Underlying storage failure
    #[error(transparent)]
    Storage(#[from] OrmError),
}
