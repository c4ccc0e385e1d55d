//! Snapshot persistence with checksum verification.


pub mod io_utils;
pub mod snapshot;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crc32fast::Hasher;

use crate::config::SessionConfig;
use crate::database::Database;
use crate::error::OrmError;
use crate::table::Table;

pub use snapshot::{SnapshotFile, TableSnapshot, SNAPSHOT_VERSION};

use io_utils::{classify_io_error, retry_io_operation};

/// Persistence manager for snapshot files.
#[derive(Debug)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// Snapshot file path
    snapshot_path: PathBuf,
    /// Verify table checksums on load
    verify_checksums: bool,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retries in milliseconds
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            snapshot_path: config.snapshot_path(),
            verify_checksums: config.verify_checksums,
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Saves every table of `db` to the snapshot file.
    ///
    /// Writes a temporary file first and renames it over the snapshot.
    pub fn save_snapshot(&self, db: &Database) -> Result<(), OrmError> {
        let snapshot = build_snapshot(db)?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| OrmError::SerializationError(e.to_string()))?;

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

        let temp_path = self.snapshot_path.with_extension("json.tmp");
        retry_io_operation(
            || {
                let mut file = File::create(&temp_path)
                    .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
                file.write_all(json.as_bytes())
                    .map_err(|e| classify_io_error(e, "Failed to write snapshot"))?;
                file.sync_all()
                    .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))
            },
            self.max_retries,
            self.retry_delay_ms,
            "snapshot write",
        )?;

        // Atomic rename
        fs::rename(&temp_path, &self.snapshot_path)
            .map_err(|e| classify_io_error(e, "Failed to rename snapshot file"))?;

        tracing::debug!(
            "Saved snapshot with {} tables to {}",
            snapshot.tables.len(),
            self.snapshot_path.display()
        );
        Ok(())
    }

    /// Loads the snapshot file into a new database.
    ///
    /// A missing snapshot file yields an empty database.
    pub fn load_snapshot(&self) -> Result<Database, OrmError> {
        if !self.snapshot_path.exists() {
            tracing::debug!(
                "No snapshot at {}, starting empty",
                self.snapshot_path.display()
            );
            return Ok(Database::new());
        }

        let contents = retry_io_operation(
            || {
                fs::read_to_string(&self.snapshot_path)
                    .map_err(|e| classify_io_error(e, "Failed to read snapshot file"))
            },
            self.max_retries,
            self.retry_delay_ms,
            "snapshot read",
        )?;

        let snapshot: SnapshotFile = serde_json::from_str(&contents)
            .map_err(|e| OrmError::DataCorruption(format!("Failed to parse snapshot: {}", e)))?;
        self.restore(snapshot)
    }

    /// Builds a database from a parsed snapshot.
    pub fn restore(&self, snapshot: SnapshotFile) -> Result<Database, OrmError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(OrmError::DataCorruption(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let db = Database::new();
        for (name, table_snapshot) in snapshot.tables {
            if self.verify_checksums {
                verify_checksum(&name, &table_snapshot, snapshot.checksums.get(&name))?;
            }
            db.attach_table(restore_table(name, table_snapshot)?)?;
        }
        Ok(db)
    }
}

/// Captures every table of `db` with checksums.
pub fn build_snapshot(db: &Database) -> Result<SnapshotFile, OrmError> {
    let tables: BTreeMap<String, TableSnapshot> = db.with_tables_map(|tables| {
        tables
            .iter()
            .map(|(name, table)| {
                let snapshot = TableSnapshot {
                    unique_columns: table.unique_columns.clone(),
                    next_id: table.current_next_id(),
                    rows: table.rows().cloned().collect(),
                };
                (name.clone(), snapshot)
            })
            .collect()
    });

    let mut checksums = BTreeMap::new();
    for (name, table) in &tables {
        checksums.insert(name.clone(), table_checksum(table)?);
    }

    Ok(SnapshotFile {
        version: SNAPSHOT_VERSION,
        tables,
        checksums,
    })
}

/// Calculates the CRC32 checksum of a table's serialized contents.
pub fn table_checksum(table: &TableSnapshot) -> Result<u32, OrmError> {
    let bytes =
        serde_json::to_vec(table).map_err(|e| OrmError::SerializationError(e.to_string()))?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}

fn verify_checksum(
    name: &str,
    table: &TableSnapshot,
    expected: Option<&u32>,
) -> Result<(), OrmError> {
    let expected = match expected {
        Some(expected) => *expected,
        None => return Ok(()),
    };
    let actual = table_checksum(table)?;
    if actual != expected {
        return Err(OrmError::DataCorruption(format!(
            "Checksum mismatch for table '{}': expected {:08x}, got {:08x}",
            name, expected, actual
        )));
    }
    Ok(())
}

fn restore_table(name: String, snapshot: TableSnapshot) -> Result<Table, OrmError> {
    let mut table = Table::create(name, snapshot.unique_columns);
    for row in snapshot.rows {
        table.insert_row(row).map_err(|e| {
            OrmError::DataCorruption(format!("Invalid row in table '{}': {}", table.name, e))
        })?;
    }
    table.advance_next_id(snapshot.next_id.saturating_sub(1));
    Ok(table)
}
