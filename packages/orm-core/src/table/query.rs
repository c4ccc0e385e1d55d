//! Query-related methods for table operations.

use serde_json::Value;

use super::Table;
use crate::entity::Row;

impl Table {
    /// Queries rows with simple column equality filters.
    ///
    /// # Arguments
    /// * `filters` - Column name to value pairs; a missing column compares as null
    ///
    /// # Returns
    /// Matching rows in id order.
    pub fn query_rows(&self, filters: &[(&str, Value)]) -> Vec<Row> {
        self.rows
            .values()
            .filter(|row| {
                filters
                    .iter()
                    .all(|(column, expected)| row.get(*column).unwrap_or(&Value::Null) == expected)
            })
            .cloned()
            .collect()
    }
}
