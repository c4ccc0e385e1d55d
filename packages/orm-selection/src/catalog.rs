//! Field catalog loading and optional session-scoped caching.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use orm_core::{OrmError, Session};

use crate::entities::{BiographyField, BiographyFieldChoice};

/// Every field with its choices, indexed by field id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    fields: BTreeMap<u64, BiographyField>,
}

impl Catalog {
    /// Loads all fields with their choices eagerly joined, in one query.
    pub fn load(session: &Session) -> Result<Self, OrmError> {
        let fields = session.find_all_indexed_with::<BiographyField, BiographyFieldChoice>()?;
        Ok(Self { fields })
    }

    /// Builds a catalog from already loaded fields. Fields without an id are skipped.
    pub fn from_fields(fields: impl IntoIterator<Item = BiographyField>) -> Self {
        let fields = fields
            .into_iter()
            .filter_map(|f| f.id.map(|id| (id, f)))
            .collect();
        Self { fields }
    }

    /// Looks up a field by id.
    pub fn field(&self, id: u64) -> Option<&BiographyField> {
        self.fields.get(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in id order.
    pub fn fields(&self) -> impl Iterator<Item = &BiographyField> {
        self.fields.values()
    }
}

#[derive(Debug)]
struct CachedCatalog {
    /// Instance id of the database the catalog was read from
    database: u64,
    /// Write generation at load time
    generation: u64,
    catalog: Arc<Catalog>,
}

/// Catalog snapshot reused until the database it came from is written to.
#[derive(Debug, Default)]
pub struct CatalogCache {
    slot: ArcSwapOption<CachedCatalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached catalog when still current for `session`.
    pub fn get(&self, session: &Session) -> Option<Arc<Catalog>> {
        let cached = self.slot.load_full()?;
        let current = cached.database == database_key(session)
            && cached.generation == session.write_generation();
        current.then(|| cached.catalog.clone())
    }

    /// Stores a freshly loaded catalog for `session`.
    pub fn store(&self, session: &Session, catalog: Arc<Catalog>) {
        self.slot.store(Some(Arc::new(CachedCatalog {
            database: database_key(session),
            generation: session.write_generation(),
            catalog,
        })));
    }

    /// Drops the cached catalog.
    pub fn invalidate(&self) {
        self.slot.store(None);
    }
}

fn database_key(session: &Session) -> u64 {
    session.database().instance_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{load_fixture, FixtureDocument};
    use orm_core::config::SessionConfig;

    fn seeded_session() -> Session {
        let session = Session::in_memory(SessionConfig::default());
        crate::entities::create_schema(&session).unwrap();
        load_fixture(&session, &FixtureDocument::regression()).unwrap();
        session
    }

    #[test]
    fn test_load_joins_choices_in_order() {
        let session = seeded_session();
        let catalog = Catalog::load(&session).unwrap();

        assert_eq!(catalog.len(), 2);
        let first = catalog.field(1).unwrap();
        assert_eq!(first.alias, "question_1");
        let ids: Vec<_> = first.choice_list.iter().filter_map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(catalog.field(2).unwrap().choice_list.len(), 2);
        assert!(catalog.field(3).is_none());
    }

    #[test]
    fn test_cache_invalidated_by_writes() {
        let session = seeded_session();
        let cache = CatalogCache::new();
        assert!(cache.get(&session).is_none());

        cache.store(&session, Arc::new(Catalog::load(&session).unwrap()));
        assert!(cache.get(&session).is_some());

        let mut field = BiographyField {
            alias: "question_3".to_string(),
            label: "Question 3".to_string(),
            ..Default::default()
        };
        session.persist(&mut field).unwrap();
        assert!(cache.get(&session).is_none());
    }

    #[test]
    fn test_cache_is_per_database() {
        let first = seeded_session();
        let second = seeded_session();
        let cache = CatalogCache::new();

        cache.store(&first, Arc::new(Catalog::load(&first).unwrap()));
        assert!(cache.get(&second).is_none());

        cache.invalidate();
        assert!(cache.get(&first).is_none());
    }

    #[test]
    fn test_cache_misses_for_replacement_database() {
        let cache = CatalogCache::new();
        for _ in 0..20 {
            let session = seeded_session();
            assert!(cache.get(&session).is_none());
            cache.store(&session, Arc::new(Catalog::load(&session).unwrap()));
            assert!(cache.get(&session).is_some());
        }
    }
}
