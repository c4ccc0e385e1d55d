//! Row storage and column queries for a single table.

mod query;
#[allow(clippy::module_inception)]
mod table;

pub use table::Table;
