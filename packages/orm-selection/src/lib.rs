//! Biography entities and the post-load field selection resolver.
//!
//! A [`Biography`](entities::Biography) stores which answers were picked
//! for each question as a JSON payload. After every load the
//! [`SelectionResolver`](resolver::SelectionResolver) turns that payload
//! into an in-memory list of [`FieldSelection`](entities::FieldSelection)s
//! against the current field catalog.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod fixture;
pub mod payload;
pub mod resolver;

pub use catalog::{Catalog, CatalogCache};
pub use entities::{Biography, BiographyField, BiographyFieldChoice, FieldSelection, User};
pub use error::SelectionError;
pub use payload::{decode_payload, Selection};
pub use resolver::{choice_selected, resolve, ResolverStats, SelectionResolver};
