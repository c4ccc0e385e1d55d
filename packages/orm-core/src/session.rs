//! Session: typed loads, inserts and lifecycle event dispatch over a [`Database`].
//!
//! Every load call hydrates rows into entities and fires
//! [`LifecycleEvent::PostLoad`] once per hydrated entity, in load order,
//! before returning. A listener error aborts the whole call and nothing is
//! returned.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::config::SessionConfig;
use crate::database::Database;
use crate::entity::{self, Entity, OneToMany, OneToOne, Row};
use crate::error::OrmError;
use crate::event::{EventManager, LifecycleEvent, LifecycleEventArgs};
use crate::persistence::PersistenceManager;

/// Unit of interaction with the database.
#[derive(Debug)]
pub struct Session {
    db: Arc<Database>,
    config: SessionConfig,
    events: EventManager,
}

impl Session {
    /// Creates a session over an existing database.
    pub fn new(db: Arc<Database>, config: SessionConfig) -> Self {
        Self {
            db,
            config,
            events: EventManager::new(),
        }
    }

    /// Creates a session over a fresh empty database.
    pub fn in_memory(config: SessionConfig) -> Self {
        Self::new(Arc::new(Database::new()), config)
    }

    /// Returns the underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the listener registry for this session.
    pub fn event_manager(&self) -> &EventManager {
        &self.events
    }

    /// Generation counter that changes whenever stored data changes.
    pub fn write_generation(&self) -> u64 {
        self.db.write_generation()
    }

    /// Creates the table backing `E`.
    pub fn create_schema<E: Entity>(&self) -> Result<(), OrmError> {
        self.db.create_table(E::TABLE, E::UNIQUE_COLUMNS)
    }

    /// Drops the table backing `E`.
    pub fn drop_schema<E: Entity>(&self) -> Result<(), OrmError> {
        self.db.delete_table(E::TABLE)
    }

    /// Inserts `record` and assigns its id.
    ///
    /// # Returns
    /// `Result<u64, OrmError>` containing the assigned id.
    pub fn persist<E: Entity>(&self, record: &mut E) -> Result<u64, OrmError> {
        self.dispatch(LifecycleEvent::PrePersist, record)?;

        let row = entity::to_row(record)?;
        let id = self.db.with_table_mut(E::TABLE, |t| t.insert_row(row))??;
        record.set_id(id);
        tracing::debug!("Persisted '{}' row {}", E::TABLE, id);

        self.dispatch(LifecycleEvent::PostPersist, record)?;
        Ok(id)
    }

    /// Loads one entity by id.
    pub fn find<E: Entity>(&self, id: u64) -> Result<Option<E>, OrmError> {
        let row = self
            .db
            .with_table(E::TABLE, |t| t.get_row(id).cloned())?;
        row.map(|row| self.hydrate(row)).transpose()
    }

    /// Loads one entity by id, failing when it does not exist.
    pub fn get<E: Entity>(&self, id: u64) -> Result<E, OrmError> {
        self.find(id)?.ok_or_else(|| OrmError::RowNotFound {
            table: E::TABLE.to_string(),
            id,
        })
    }

    /// Loads every entity of type `E` in id order.
    pub fn find_all<E: Entity>(&self) -> Result<Vec<E>, OrmError> {
        let rows = self.snapshot_rows(E::TABLE)?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// Loads entities whose `column` equals `value`, in id order.
    pub fn find_by<E: Entity>(&self, column: &str, value: &Value) -> Result<Vec<E>, OrmError> {
        let rows = self
            .db
            .with_table(E::TABLE, |t| t.query_rows(&[(column, value.clone())]))?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// Loads every parent indexed by id with its children eagerly joined.
    ///
    /// Parents without children are included with an empty collection.
    /// Children are hydrated (and their post-load fired) before the parent
    /// they belong to, so a parent's listeners see its children attached.
    pub fn find_all_indexed_with<P, C>(&self) -> Result<BTreeMap<u64, P>, OrmError>
    where
        P: OneToMany<C>,
        C: Entity,
    {
        let parent_rows = self.snapshot_rows(P::TABLE)?;
        let child_rows = self.snapshot_rows(C::TABLE)?;

        let mut children_by_parent: HashMap<u64, Vec<Row>> = HashMap::new();
        for row in child_rows {
            if let Some(parent_id) = entity::reference(&row, P::MAPPED_BY) {
                children_by_parent.entry(parent_id).or_default().push(row);
            }
        }

        let mut indexed = BTreeMap::new();
        for row in parent_rows {
            let id = entity::reference(&row, entity::ID_COLUMN).ok_or_else(|| {
                OrmError::DataCorruption(format!("row without id in table '{}'", P::TABLE))
            })?;

            let children = children_by_parent
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .map(|row| self.hydrate::<C>(row))
                .collect::<Result<Vec<_>, _>>()?;

            let mut parent: P = entity::from_row(row)?;
            parent.set_children(children);
            self.dispatch(LifecycleEvent::PostLoad, &mut parent)?;
            indexed.insert(id, parent);
        }

        tracing::debug!(
            "Loaded {} '{}' rows joined with '{}'",
            indexed.len(),
            P::TABLE,
            C::TABLE
        );
        Ok(indexed)
    }

    /// Loads every owner with its one-to-one target eagerly joined.
    ///
    /// Inner join: owners whose join column is null or points at a missing
    /// target are left out. Owners sharing a target each get their own copy.
    /// For each owner the target is hydrated first.
    pub fn find_all_joined<O, T>(&self) -> Result<Vec<O>, OrmError>
    where
        O: OneToOne<T>,
        T: Entity,
    {
        let owner_rows = self.snapshot_rows(O::TABLE)?;
        let targets: HashMap<u64, Row> = self
            .snapshot_rows(T::TABLE)?
            .into_iter()
            .filter_map(|row| entity::reference(&row, entity::ID_COLUMN).map(|id| (id, row)))
            .collect();

        let mut loaded = Vec::with_capacity(owner_rows.len());
        for row in owner_rows {
            let target_row = match entity::reference(&row, O::JOIN_COLUMN)
                .and_then(|target_id| targets.get(&target_id).cloned())
            {
                Some(target_row) => target_row,
                None => continue,
            };

            let target = self.hydrate::<T>(target_row)?;
            let mut owner: O = entity::from_row(row)?;
            owner.set_related(target);
            self.dispatch(LifecycleEvent::PostLoad, &mut owner)?;
            loaded.push(owner);
        }

        tracing::debug!(
            "Loaded {} '{}' rows joined with '{}'",
            loaded.len(),
            O::TABLE,
            T::TABLE
        );
        Ok(loaded)
    }

    /// Writes every table to the configured snapshot file.
    pub fn save_snapshot(&self) -> Result<(), OrmError> {
        PersistenceManager::new(&self.config).save_snapshot(&self.db)
    }

    /// Opens a session over the database stored in the configured snapshot file.
    pub fn open_snapshot(config: SessionConfig) -> Result<Self, OrmError> {
        let db = PersistenceManager::new(&config).load_snapshot()?;
        Ok(Self::new(Arc::new(db), config))
    }

    fn snapshot_rows(&self, table: &str) -> Result<Vec<Row>, OrmError> {
        self.db.with_table(table, |t| t.rows().cloned().collect())
    }

    fn hydrate<E: Entity>(&self, row: Row) -> Result<E, OrmError> {
        let mut record: E = entity::from_row(row)?;
        self.dispatch(LifecycleEvent::PostLoad, &mut record)?;
        Ok(record)
    }

    fn dispatch<E: Entity>(&self, event: LifecycleEvent, record: &mut E) -> Result<(), OrmError> {
        let mut args = LifecycleEventArgs::new(record, self);
        self.events.dispatch(event, &mut args)
    }
}
