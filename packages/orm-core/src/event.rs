//! Lifecycle events and listener registry.
//!
//! Listeners are registered on a session's [`EventManager`] and receive every
//! entity of every type; a listener interested in one entity type downcasts
//! through [`LifecycleEventArgs::entity_mut`] and ignores the rest.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entity::Entity;
use crate::error::{ListenerError, OrmError};
use crate::session::Session;

/// Entity lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Entity was hydrated from storage
    PostLoad,
    /// Entity is about to be inserted
    PrePersist,
    /// Entity was inserted and has its id
    PostPersist,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::PostLoad => "postLoad",
            LifecycleEvent::PrePersist => "prePersist",
            LifecycleEvent::PostPersist => "postPersist",
        };
        f.write_str(name)
    }
}

/// Arguments passed to a listener.
pub struct LifecycleEventArgs<'a> {
    entity: &'a mut dyn Any,
    table: &'static str,
    session: &'a Session,
}

impl<'a> LifecycleEventArgs<'a> {
    /// Builds arguments for `entity`.
    pub fn new<E: Entity>(entity: &'a mut E, session: &'a Session) -> Self {
        Self {
            entity,
            table: E::TABLE,
            session,
        }
    }

    /// Table of the entity the event fired for.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// The entity, for type checks.
    pub fn entity(&self) -> &dyn Any {
        &*self.entity
    }

    /// The entity as `E`, or `None` when it is another type.
    pub fn entity_mut<E: Entity>(&mut self) -> Option<&mut E> {
        self.entity.downcast_mut::<E>()
    }

    /// Session that loaded the entity, usable for further reads.
    pub fn session(&self) -> &'a Session {
        self.session
    }
}

/// Receives lifecycle events. Every hook defaults to a no-op.
pub trait EventListener: Send + Sync {
    /// Called once per entity right after it is hydrated.
    fn post_load(&self, _args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        Ok(())
    }

    /// Called before an entity is inserted.
    fn pre_persist(&self, _args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        Ok(())
    }

    /// Called after an entity is inserted.
    fn post_persist(&self, _args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Registry of listeners per lifecycle event.
#[derive(Default)]
pub struct EventManager {
    listeners: RwLock<HashMap<LifecycleEvent, Vec<Arc<dyn EventListener>>>>,
}

impl EventManager {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for each of `events`.
    pub fn add_event_listener(&self, events: &[LifecycleEvent], listener: Arc<dyn EventListener>) {
        let mut listeners = self.listeners.write();
        for event in events {
            listeners.entry(*event).or_default().push(listener.clone());
        }
    }

    /// Removes `listener` from each of `events`. Returns how many registrations were dropped.
    pub fn remove_event_listener(
        &self,
        events: &[LifecycleEvent],
        listener: &Arc<dyn EventListener>,
    ) -> usize {
        let mut listeners = self.listeners.write();
        let mut removed = 0;
        for event in events {
            if let Some(registered) = listeners.get_mut(event) {
                let before = registered.len();
                registered.retain(|l| !Arc::ptr_eq(l, listener));
                removed += before - registered.len();
            }
        }
        removed
    }

    /// Returns true when at least one listener is registered for `event`.
    pub fn has_listeners(&self, event: LifecycleEvent) -> bool {
        self.listener_count(event) > 0
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: LifecycleEvent) -> usize {
        self.listeners.read().get(&event).map_or(0, Vec::len)
    }

    /// Dispatches `event` to its listeners in registration order.
    ///
    /// The registry lock is released before listeners run, so listeners may
    /// issue queries that dispatch further events. The first error stops
    /// dispatch and is returned.
    pub fn dispatch(
        &self,
        event: LifecycleEvent,
        args: &mut LifecycleEventArgs<'_>,
    ) -> Result<(), OrmError> {
        let listeners = match self.listeners.read().get(&event) {
            Some(registered) if !registered.is_empty() => registered.clone(),
            _ => return Ok(()),
        };

        tracing::trace!(
            "Dispatching {} for '{}' to {} listener(s)",
            event,
            args.table(),
            listeners.len()
        );

        for listener in listeners {
            let result = match event {
                LifecycleEvent::PostLoad => listener.post_load(args),
                LifecycleEvent::PrePersist => listener.pre_persist(args),
                LifecycleEvent::PostPersist => listener.post_persist(args),
            };
            result.map_err(|e| OrmError::listener(event, e))?;
        }
        Ok(())
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<_, _> = listeners.iter().map(|(e, l)| (*e, l.len())).collect();
        f.debug_struct("EventManager")
            .field("listeners", &counts)
            .finish()
    }
}
