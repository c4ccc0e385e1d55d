//! Database container managing tables.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::OrmError;
use crate::table::Table;

/// Source of process-wide unique database ids. Never reused, unlike addresses.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Database container holding all tables.
#[derive(Debug)]
pub struct Database {
    /// Map of table name to table instance
    tables: RwLock<HashMap<String, Table>>,
    /// Bumped on every mutation, lets readers detect stale cached data
    write_generation: AtomicU64,
    /// Identifies this database for the lifetime of the process
    instance_id: u64,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            write_generation: AtomicU64::new(0),
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id unique to this database within the process.
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Creates a new table with the given name and unique columns.
    pub fn create_table(&self, name: &str, unique_columns: &[&str]) -> Result<(), OrmError> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(OrmError::TableAlreadyExists(name.to_string()));
        }
        let unique_columns = unique_columns.iter().map(|c| c.to_string()).collect();
        tables.insert(name.to_string(), Table::create(name.to_string(), unique_columns));
        self.bump_generation();
        Ok(())
    }

    /// Inserts an already built table, replacing nothing.
    pub fn attach_table(&self, table: Table) -> Result<(), OrmError> {
        let mut tables = self.tables.write();
        if tables.contains_key(&table.name) {
            return Err(OrmError::TableAlreadyExists(table.name));
        }
        tables.insert(table.name.clone(), table);
        self.bump_generation();
        Ok(())
    }

    /// Deletes a table by name.
    pub fn delete_table(&self, name: &str) -> Result<(), OrmError> {
        let mut tables = self.tables.write();
        tables.remove(name).ok_or_else(|| OrmError::TableNotFound {
            table: name.to_string(),
        })?;
        self.bump_generation();
        Ok(())
    }

    /// Executes a closure with read access to a table.
    ///
    /// The lock is held for the duration of the closure, so the closure must
    /// not call back into the database for writes.
    pub fn with_table<F, R>(&self, name: &str, f: F) -> Result<R, OrmError>
    where
        F: FnOnce(&Table) -> R,
    {
        let tables = self.tables.read();
        let table = tables.get(name).ok_or_else(|| OrmError::TableNotFound {
            table: name.to_string(),
        })?;
        Ok(f(table))
    }

    /// Executes a closure with write access to a table.
    pub fn with_table_mut<F, R>(&self, name: &str, f: F) -> Result<R, OrmError>
    where
        F: FnOnce(&mut Table) -> R,
    {
        let mut tables = self.tables.write();
        let table = tables.get_mut(name).ok_or_else(|| OrmError::TableNotFound {
            table: name.to_string(),
        })?;
        let result = f(table);
        self.bump_generation();
        Ok(result)
    }

    /// Executes a closure with read access to every table.
    pub fn with_tables_map<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HashMap<String, Table>) -> R,
    {
        let tables = self.tables.read();
        f(&tables)
    }

    /// Returns all table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read();
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of tables in the database.
    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true when the table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Current write generation.
    pub fn write_generation(&self) -> u64 {
        self.write_generation.load(Ordering::Acquire)
    }

    fn bump_generation(&self) {
        self.write_generation.fetch_add(1, Ordering::AcqRel);
    }
}
