//! Snapshot persistence through the session.

use ntest::timeout;
use orm_core::config::SessionConfig;
use orm_core::Session;
use tempfile::tempdir;

use super::helpers::{seed_authors, session_with, Author, Post};

#[timeout(1000)]
#[test]
fn test_session_snapshot_round_trip() {
    let temp_dir = tempdir().unwrap();
    let config = SessionConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    };

    let session = session_with(config.clone());
    seed_authors(&session);
    session.save_snapshot().unwrap();

    let reopened = Session::open_snapshot(config).unwrap();
    let authors = reopened.find_all_indexed_with::<Author, Post>().unwrap();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[&1].posts.len(), 2);

    let mut carl = Author {
        name: "carl".to_string(),
        ..Default::default()
    };
    assert_eq!(reopened.persist(&mut carl).unwrap(), 3);
}
