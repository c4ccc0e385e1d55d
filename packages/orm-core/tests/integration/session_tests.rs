//! Typed loads and joins.

use ntest::timeout;
use orm_core::error::OrmError;
use serde_json::json;

use super::helpers::{seed_authors, seed_people, session, Author, Passport, Person, Post};

#[timeout(1000)]
#[test]
fn test_persist_assigns_ids() {
    let session = session();
    let mut author = Author {
        name: "ann".to_string(),
        ..Default::default()
    };
    let id = session.persist(&mut author).unwrap();
    assert_eq!(id, 1);
    assert_eq!(author.id, Some(1));

    let mut clash = Author {
        name: "ann".to_string(),
        ..Default::default()
    };
    let err = session.persist(&mut clash).unwrap_err();
    assert!(matches!(err, OrmError::UniqueViolation { .. }));
    assert_eq!(clash.id, None);
}

#[timeout(1000)]
#[test]
fn test_find_and_get() {
    let session = session();
    seed_authors(&session);

    let bob: Author = session.find(2).unwrap().unwrap();
    assert_eq!(bob.name, "bob");
    assert!(session.find::<Author>(99).unwrap().is_none());
    assert!(matches!(
        session.get::<Author>(99),
        Err(OrmError::RowNotFound { id: 99, .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_find_all_and_find_by() {
    let session = session();
    seed_authors(&session);

    let posts: Vec<Post> = session.find_all().unwrap();
    assert_eq!(posts.len(), 2);

    let titled: Vec<Post> = session.find_by("title", &json!("a2")).unwrap();
    assert_eq!(titled.len(), 1);
    assert_eq!(titled[0].id, Some(2));
}

#[timeout(1000)]
#[test]
fn test_find_all_indexed_with_children() {
    let session = session();
    seed_authors(&session);

    let authors = session.find_all_indexed_with::<Author, Post>().unwrap();
    assert_eq!(authors.keys().copied().collect::<Vec<_>>(), vec![1, 2]);

    let titles: Vec<_> = authors[&1].posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["a1", "a2"]);
    assert!(authors[&2].posts.is_empty());
}

#[timeout(1000)]
#[test]
fn test_find_all_joined_is_inner_join() {
    let session = session();
    seed_people(&session);

    let people = session.find_all_joined::<Person, Passport>().unwrap();
    let names: Vec<_> = people.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["p1", "p2"]);
    assert_eq!(people[1].passport.as_ref().unwrap().number, "N2");
}

#[timeout(1000)]
#[test]
fn test_find_all_joined_keeps_owners_sharing_a_target() {
    let session = session();
    seed_people(&session);
    let mut twin = Person {
        name: "p4".to_string(),
        passport_id: Some(1),
        ..Default::default()
    };
    session.persist(&mut twin).unwrap();

    let people = session.find_all_joined::<Person, Passport>().unwrap();
    let joined: Vec<_> = people
        .iter()
        .map(|p| (p.name.as_str(), p.passport.as_ref().unwrap().number.as_str()))
        .collect();
    assert_eq!(joined, vec![("p1", "N1"), ("p2", "N2"), ("p4", "N1")]);
}

#[timeout(1000)]
#[test]
fn test_unknown_table() {
    let session = orm_core::Session::in_memory(Default::default());
    assert!(matches!(
        session.find_all::<Author>(),
        Err(OrmError::TableNotFound { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_drop_schema() {
    let session = session();
    session.drop_schema::<Post>().unwrap();
    assert!(!session.database().has_table("post"));
}
