//! Table row storage.
//!
//! Each table has:
//! - Rows keyed by id, iterated in id order
//! - Record ID sequence generator
//! - Optional unique column constraints

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::entity::{Row, ID_COLUMN};
use crate::error::OrmError;

/// Table row storage.
#[derive(Debug)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Rows keyed by id
    pub rows: BTreeMap<u64, Row>,
    /// Columns whose non-null values must be unique
    pub unique_columns: Vec<String>,
    /// Next record ID to assign (atomic counter)
    pub next_id: AtomicU64,
}

impl Table {
    /// Creates a new empty table.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `unique_columns` - Columns carrying a unique constraint
    pub fn create(name: String, unique_columns: Vec<String>) -> Self {
        Self {
            name,
            rows: BTreeMap::new(),
            unique_columns,
            next_id: AtomicU64::new(1), // Start IDs at 1
        }
    }

    /// Atomically increments and returns the next record ID.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the current next ID value without incrementing.
    pub fn current_next_id(&self) -> u64 {
        self.next_id.load(Ordering::Acquire)
    }

    /// Moves the id sequence forward so it never hands out `id` again.
    pub fn advance_next_id(&self, id: u64) {
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    /// Returns the number of rows in the table.
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// Inserts a row, assigning an id when its id column is null or absent.
    ///
    /// A rejected row leaves the id sequence untouched.
    ///
    /// # Returns
    /// `Result<u64, OrmError>` containing the id of the stored row.
    pub fn insert_row(&mut self, mut row: Row) -> Result<u64, OrmError> {
        let explicit_id = match row.get(ID_COLUMN) {
            None | Some(Value::Null) => None,
            Some(value) => {
                let id = value.as_u64().ok_or_else(|| OrmError::TypeMismatch {
                    expected: format!("integer id for table '{}'", self.name),
                    got: value.to_string(),
                })?;
                if self.rows.contains_key(&id) {
                    return Err(OrmError::DuplicateId {
                        table: self.name.clone(),
                        id,
                    });
                }
                Some(id)
            }
        };

        self.check_unique(&row)?;

        let id = match explicit_id {
            Some(id) => {
                self.advance_next_id(id);
                id
            }
            None => self.next_id(),
        };

        row.insert(ID_COLUMN.to_string(), Value::from(id));
        self.rows.insert(id, row);
        Ok(id)
    }

    /// Returns the row with the given id.
    pub fn get_row(&self, id: u64) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Iterates over all rows in id order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    fn check_unique(&self, row: &Row) -> Result<(), OrmError> {
        for column in &self.unique_columns {
            let value = match row.get(column) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };
            if self.rows.values().any(|existing| existing.get(column) == Some(value)) {
                return Err(OrmError::UniqueViolation {
                    table: self.name.clone(),
                    column: column.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}
