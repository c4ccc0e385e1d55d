//! Snapshot structs for persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Row;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot file format for persistence.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Snapshot version
    pub version: u32,
    /// Table contents keyed by table name
    pub tables: BTreeMap<String, TableSnapshot>,
    /// Per-table checksums for corruption detection
    #[serde(default)]
    pub checksums: BTreeMap<String, u32>,
}

/// Contents of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Columns carrying a unique constraint
    #[serde(default)]
    pub unique_columns: Vec<String>,
    /// Next id the sequence will hand out
    pub next_id: u64,
    /// Rows in id order
    pub rows: Vec<Row>,
}
