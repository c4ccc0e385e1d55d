//! Core persistence engine for the entity session.
//!
//! Provides the in-memory row store, entity hydration, lifecycle
//! event dispatch, and JSON snapshot persistence.

pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod event;
pub mod persistence;
pub mod session;
pub mod table;

pub use entity::{Entity, OneToMany, OneToOne};
pub use error::OrmError;
pub use event::{EventListener, EventManager, LifecycleEvent, LifecycleEventArgs};
pub use session::Session;
