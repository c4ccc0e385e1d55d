//! Entity mapping traits and row hydration.
//!
//! Entities are stored as JSON objects keyed by column name. Hydrating an
//! entity means deserializing its stored row; fields marked
//! `#[serde(skip)]` are transient and never reach storage.

use std::any::Any;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::OrmError;

/// Stored representation of a single entity.
pub type Row = Map<String, Value>;

/// Name of the identifier column present in every row.
pub const ID_COLUMN: &str = "id";

/// A type mapped onto a table.
pub trait Entity: Serialize + DeserializeOwned + Any + Send + Sync {
    /// Table the entity is stored in.
    const TABLE: &'static str;

    /// Columns whose non-null values must be unique within the table.
    const UNIQUE_COLUMNS: &'static [&'static str] = &[];

    /// Identifier, `None` until the entity is persisted.
    fn id(&self) -> Option<u64>;

    /// Assigns the identifier generated on insert.
    fn set_id(&mut self, id: u64);
}

/// Inverse side of a one-to-many association.
pub trait OneToMany<C: Entity>: Entity {
    /// Column on the child table holding the parent id.
    const MAPPED_BY: &'static str;

    /// Attaches the loaded children, in id order.
    fn set_children(&mut self, children: Vec<C>);
}

/// Owning side of a one-to-one association.
pub trait OneToOne<T: Entity>: Entity {
    /// Column on the owning table holding the target id.
    const JOIN_COLUMN: &'static str;

    /// Attaches the loaded target.
    fn set_related(&mut self, related: T);
}

/// Serializes an entity into its stored row.
pub fn to_row<E: Entity>(entity: &E) -> Result<Row, OrmError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(OrmError::Hydration {
            table: E::TABLE.to_string(),
            message: format!("entity serialized to {} instead of an object", kind(&other)),
        }),
        Err(e) => Err(OrmError::Hydration {
            table: E::TABLE.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Deserializes a stored row into an entity.
pub fn from_row<E: Entity>(row: Row) -> Result<E, OrmError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| OrmError::Hydration {
        table: E::TABLE.to_string(),
        message: e.to_string(),
    })
}

/// Reads an integer reference column, `None` when null or absent.
pub fn reference(row: &Row, column: &str) -> Option<u64> {
    row.get(column).and_then(Value::as_u64)
}

/// Returns a string representation of a JSON value's type.
pub(crate) fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
