//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{Entity, EntityId, IdRange, ReferenceKind};
use crate::storage::{BatchRows, NoDataFlags};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the pipeline.
/// Nothing about run progress is stored separately: the processed set is
/// always derived from committed link, price and flag rows.
pub trait Storage {
    // ===== Catalog =====

    /// Inserts catalog entities, ignoring ids that already exist
    ///
    /// # Returns
    ///
    /// The number of entities actually inserted
    fn insert_entities(&mut self, entities: &[Entity]) -> StorageResult<usize>;

    /// Gets all entity ids in ascending order, optionally restricted to a range
    fn entity_ids(&self, range: Option<IdRange>) -> StorageResult<Vec<EntityId>>;

    // ===== Checkpoint =====

    /// Gets the ids of every entity whose processing was committed
    ///
    /// This is the union of entities with at least one genre, category or tag
    /// link, entities with a price, and entities flagged `no_data`.
    fn processed_entity_ids(&self) -> StorageResult<HashSet<EntityId>>;

    /// Gets every reference id already stored for a kind
    fn reference_ids(&self, kind: ReferenceKind) -> StorageResult<HashSet<i64>>;

    // ===== Batch Commit =====

    /// Writes a batch atomically
    ///
    /// Order: new reference rows, `no_data*` flags, link rows, prices. Any
    /// failure rolls the whole batch back.
    fn commit_batch(&mut self, rows: &BatchRows) -> StorageResult<()>;

    /// Deletes all link and price rows and resets `no_data*` flags
    ///
    /// Reference rows and catalog entities are kept.
    fn clear_ingested(&mut self) -> StorageResult<()>;

    // ===== Read-back =====

    /// Gets the stored name of a reference id
    fn reference_name(&self, kind: ReferenceKind, id: i64) -> StorageResult<Option<String>>;

    /// Gets the reference ids linked to an entity, ascending
    fn linked_references(
        &self,
        kind: ReferenceKind,
        entity_id: EntityId,
    ) -> StorageResult<Vec<i64>>;

    /// Gets `(tag_id, tag_order)` pairs of an entity, ordered by tag order
    fn tag_links_for(&self, entity_id: EntityId) -> StorageResult<Vec<(i64, u32)>>;

    /// Gets the stored price of an entity
    fn price_for(&self, entity_id: EntityId) -> StorageResult<Option<i64>>;

    /// Gets the `no_data*` flags of an entity
    fn no_data_flags(&self, entity_id: EntityId) -> StorageResult<NoDataFlags>;

    // ===== Statistics =====

    /// Counts catalog entities
    fn count_entities(&self) -> StorageResult<u64>;

    /// Counts entities flagged `no_data`
    fn count_no_data(&self) -> StorageResult<u64>;

    /// Counts entities flagged `no_data_tags`
    fn count_no_tags(&self) -> StorageResult<u64>;

    /// Counts reference rows of a kind
    fn count_references(&self, kind: ReferenceKind) -> StorageResult<u64>;

    /// Counts link rows of a kind
    fn count_links(&self, kind: ReferenceKind) -> StorageResult<u64>;

    /// Counts stored prices
    fn count_prices(&self) -> StorageResult<u64>;
}
