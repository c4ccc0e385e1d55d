//! Lifecycle event dispatch.

use std::sync::Arc;

use ntest::timeout;
use orm_core::error::{ListenerError, OrmError};
use orm_core::{EventListener, LifecycleEvent, LifecycleEventArgs};
use parking_lot::Mutex;

use super::helpers::{seed_authors, seed_people, session, Author, Passport, Person, Post};

/// Records the table of every entity it sees.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(LifecycleEvent, &'static str)>>,
}

impl EventListener for Recorder {
    fn post_load(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        self.seen.lock().push((LifecycleEvent::PostLoad, args.table()));
        Ok(())
    }

    fn pre_persist(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        self.seen.lock().push((LifecycleEvent::PrePersist, args.table()));
        Ok(())
    }

    fn post_persist(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        self.seen.lock().push((LifecycleEvent::PostPersist, args.table()));
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("refusing author {0}")]
struct Refused(String);

/// Fails on one author name, ignores every other entity.
struct RefuseAuthor(&'static str);

impl EventListener for RefuseAuthor {
    fn post_load(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        match args.entity_mut::<Author>() {
            Some(author) if author.name == self.0 => Err(Refused(author.name.clone()).into()),
            _ => Ok(()),
        }
    }
}

/// Uppercases person names and counts passports through a nested query.
struct NestedQuery;

impl EventListener for NestedQuery {
    fn post_load(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        let session = args.session();
        if let Some(person) = args.entity_mut::<Person>() {
            let passports: Vec<Passport> = session.find_all()?;
            person.name = format!("{}:{}", person.name.to_uppercase(), passports.len());
        }
        Ok(())
    }
}

#[timeout(1000)]
#[test]
fn test_post_load_fires_once_per_entity_children_first() {
    let session = session();
    seed_authors(&session);

    let recorder = Arc::new(Recorder::default());
    session
        .event_manager()
        .add_event_listener(&[LifecycleEvent::PostLoad], recorder.clone());

    session.find_all_indexed_with::<Author, Post>().unwrap();

    let seen = recorder.seen.lock().clone();
    let tables: Vec<_> = seen.iter().map(|(_, t)| *t).collect();
    assert_eq!(tables, vec!["post", "post", "author", "author"]);
}

#[timeout(1000)]
#[test]
fn test_persist_events_in_order() {
    let session = session();
    let recorder = Arc::new(Recorder::default());
    session.event_manager().add_event_listener(
        &[LifecycleEvent::PrePersist, LifecycleEvent::PostPersist],
        recorder.clone(),
    );

    let mut author = Author {
        name: "ann".to_string(),
        ..Default::default()
    };
    session.persist(&mut author).unwrap();
    session.find_all::<Author>().unwrap();

    assert_eq!(
        *recorder.seen.lock(),
        vec![
            (LifecycleEvent::PrePersist, "author"),
            (LifecycleEvent::PostPersist, "author"),
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_listener_error_aborts_load() {
    let session = session();
    seed_authors(&session);
    session
        .event_manager()
        .add_event_listener(&[LifecycleEvent::PostLoad], Arc::new(RefuseAuthor("bob")));

    let err = session.find_all::<Author>().unwrap_err();
    assert!(matches!(
        err,
        OrmError::Listener {
            event: LifecycleEvent::PostLoad,
            ..
        }
    ));
    assert_eq!(err.listener_error::<Refused>().unwrap().0, "bob");

    // Other types and other rows are unaffected
    assert_eq!(session.find_all::<Post>().unwrap().len(), 2);
    assert!(session.find::<Author>(1).unwrap().is_some());
}

#[timeout(1000)]
#[test]
fn test_listener_can_query_during_load() {
    let session = session();
    seed_people(&session);
    session
        .event_manager()
        .add_event_listener(&[LifecycleEvent::PostLoad], Arc::new(NestedQuery));

    let people = session.find_all_joined::<Person, Passport>().unwrap();
    let names: Vec<_> = people.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["P1:2", "P2:2"]);
}

#[timeout(1000)]
#[test]
fn test_remove_listener() {
    let session = session();
    let listener: Arc<dyn EventListener> = Arc::new(Recorder::default());
    let events = [LifecycleEvent::PostLoad, LifecycleEvent::PostPersist];
    session
        .event_manager()
        .add_event_listener(&events, listener.clone());
    assert!(session.event_manager().has_listeners(LifecycleEvent::PostLoad));
    assert!(!session.event_manager().has_listeners(LifecycleEvent::PrePersist));

    assert_eq!(
        session
            .event_manager()
            .remove_event_listener(&events, &listener),
        2
    );
    assert_eq!(
        session.event_manager().listener_count(LifecycleEvent::PostLoad),
        0
    );
}
