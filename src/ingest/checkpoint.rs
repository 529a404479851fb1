//! Checkpoint resolution
//!
//! The checkpoint is not stored anywhere. It is recomputed from committed rows
//! at the start of every run: an entity is processed once it has any link or
//! price row, or carries the `no_data` flag.

use crate::ingest::registry::ReferenceRegistry;
use crate::model::{EntityId, IdRange, ReferenceKind};
use crate::storage::Storage;
use crate::IngestError;
use std::collections::HashSet;

/// State derived from the store at the start of a run
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    /// Every known entity id, ascending
    pub frontier: Vec<EntityId>,

    /// Entities whose processing has been committed
    pub processed: HashSet<EntityId>,

    /// Reference ids already present in the store
    pub registry: ReferenceRegistry,
}

impl Checkpoint {
    /// Frontier ids not yet processed, in frontier order
    pub fn pending(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.frontier
            .iter()
            .copied()
            .filter(|id| !self.processed.contains(id))
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }
}

/// Derives the checkpoint from the current store contents
///
/// # Arguments
///
/// * `storage` - The store to read from
/// * `range` - Optional partition restricting the frontier
///
/// # Returns
///
/// * `Ok(Checkpoint)` - Frontier, processed set and seeded reference registry
/// * `Err(IngestError::StoreUnavailable)` - Any query failed; no partial result is returned
pub fn resolve_checkpoint<S: Storage + ?Sized>(
    storage: &S,
    range: Option<IdRange>,
) -> Result<Checkpoint, IngestError> {
    let frontier = storage.entity_ids(range)?;
    let processed = storage.processed_entity_ids()?;

    let registry = ReferenceRegistry::new(
        storage.reference_ids(ReferenceKind::Genre)?,
        storage.reference_ids(ReferenceKind::Category)?,
        storage.reference_ids(ReferenceKind::Tag)?,
    );

    tracing::info!(
        frontier = frontier.len(),
        processed = processed.len(),
        genres = registry.len(ReferenceKind::Genre),
        categories = registry.len(ReferenceKind::Category),
        tags = registry.len(ReferenceKind::Tag),
        "Resolved checkpoint"
    );

    Ok(Checkpoint {
        frontier,
        processed,
        registry,
    })
}
