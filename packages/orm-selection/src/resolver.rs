//! Post-load resolution of biography payloads into field selections.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use orm_core::config::SessionConfig;
use orm_core::error::ListenerError;
use orm_core::{EventListener, LifecycleEventArgs, Session};

use crate::catalog::{Catalog, CatalogCache};
use crate::entities::{Biography, BiographyFieldChoice, FieldSelection};
use crate::error::SelectionError;
use crate::payload::{decode_payload, Selection};

/// Rebuilds [`Biography::field_list`] each time a biography is loaded.
///
/// Without a cache the catalog is queried once per resolved biography.
#[derive(Debug, Default)]
pub struct SelectionResolver {
    cache: Option<CatalogCache>,
    stats: ResolverStats,
}

/// Counters kept by a resolver.
#[derive(Debug, Default)]
pub struct ResolverStats {
    resolved: AtomicU64,
    failed: AtomicU64,
    catalog_loads: AtomicU64,
}

impl ResolverStats {
    /// Biographies whose field list was assigned.
    pub fn resolved(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }

    /// Biographies whose resolution failed.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Catalog queries issued.
    pub fn catalog_loads(&self) -> u64 {
        self.catalog_loads.load(Ordering::Relaxed)
    }
}

impl SelectionResolver {
    /// Resolver that re-reads the catalog on every resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that keeps the catalog until the database changes.
    pub fn with_catalog_cache() -> Self {
        Self {
            cache: Some(CatalogCache::new()),
            stats: ResolverStats::default(),
        }
    }

    /// Resolver configured from `config.cache_catalog`.
    pub fn from_config(config: &SessionConfig) -> Self {
        if config.cache_catalog {
            Self::with_catalog_cache()
        } else {
            Self::new()
        }
    }

    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Resolves `biography` against the catalog of `session`.
    ///
    /// The field list is assigned only when every selection resolves.
    pub fn apply(&self, biography: &mut Biography, session: &Session) -> Result<(), SelectionError> {
        let result = self
            .catalog(session)
            .and_then(|catalog| resolve(biography, &catalog));

        match result {
            Ok(field_list) => {
                tracing::debug!(
                    "Resolved {} selection(s) for biography {:?}",
                    field_list.len(),
                    biography.id
                );
                biography.field_list = Some(field_list);
                self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                tracing::debug!("Resolution failed for biography {:?}: {}", biography.id, e);
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn catalog(&self, session: &Session) -> Result<Arc<Catalog>, SelectionError> {
        if let Some(catalog) = self.cache.as_ref().and_then(|c| c.get(session)) {
            return Ok(catalog);
        }

        let catalog = Arc::new(Catalog::load(session)?);
        self.stats.catalog_loads.fetch_add(1, Ordering::Relaxed);
        if let Some(cache) = &self.cache {
            cache.store(session, catalog.clone());
        }
        Ok(catalog)
    }
}

impl EventListener for SelectionResolver {
    fn post_load(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        let session = args.session();
        let Some(biography) = args.entity_mut::<Biography>() else {
            return Ok(());
        };
        self.apply(biography, session)?;
        Ok(())
    }
}

/// Resolves every selection of `biography`, in payload order.
pub fn resolve(biography: &Biography, catalog: &Catalog) -> Result<Vec<FieldSelection>, SelectionError> {
    decode_payload(biography.content.as_deref())?
        .iter()
        .map(|selection| resolve_selection(selection, catalog))
        .collect()
}

/// Pairs the selected field with its matching choices, kept in the field's order.
pub fn resolve_selection(
    selection: &Selection,
    catalog: &Catalog,
) -> Result<FieldSelection, SelectionError> {
    let field = catalog
        .field(selection.field)
        .ok_or(SelectionError::UnknownField {
            field: selection.field,
        })?;

    let selected: HashSet<u64> = selection.choice_list.iter().copied().collect();
    let choice_list = field
        .choice_list
        .iter()
        .filter(|choice| choice_selected(choice, &selected))
        .cloned()
        .collect();

    Ok(FieldSelection {
        field: field.clone(),
        choice_list,
    })
}

/// True when the choice's id is among the selected ids.
pub fn choice_selected(choice: &BiographyFieldChoice, selected: &HashSet<u64>) -> bool {
    choice.id.is_some_and(|id| selected.contains(&id))
}
