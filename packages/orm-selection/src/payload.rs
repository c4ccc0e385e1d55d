//! Selection payload decoding.
//!
//! The payload is a JSON array of `{"field": <id>, "choiceList": [<id>, ...]}`
//! objects. It is decoded straight into [`Selection`]s; any other shape is
//! rejected.

use serde::Deserialize;

use crate::error::SelectionError;

/// One decoded payload entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selection {
    /// Selected field id
    pub field: u64,
    /// Selected choice ids
    #[serde(rename = "choiceList")]
    pub choice_list: Vec<u64>,
}

/// Decodes a biography payload. A null payload holds no selections.
pub fn decode_payload(content: Option<&str>) -> Result<Vec<Selection>, SelectionError> {
    match content {
        None => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}
