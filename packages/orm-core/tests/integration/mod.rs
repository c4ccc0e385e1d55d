//! Integration test suite for the session engine.
//!
//! 1. Typed loads and joins
//! 2. Lifecycle event dispatch
//! 3. Snapshot persistence through the session

pub mod event_tests;
pub mod helpers;
pub mod session_tests;
pub mod snapshot_tests;
