//! Storage module for persisting ingested catalog data
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Catalog loading
//! - Deriving the set of already-processed entities from committed rows
//! - Atomic batch commits
//! - Read-back and statistics queries

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::model::{EntityId, NamedRef, ReferenceKind};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// An entity <-> genre or entity <-> category link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRow {
    pub entity_id: EntityId,
    pub reference_id: i64,
}

/// An entity <-> tag link with the tag's rank on the store page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLinkRow {
    pub entity_id: EntityId,
    pub tag_id: i64,
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRow {
    pub entity_id: EntityId,
    pub price: i64,
}

/// All rows produced by one batch, written in a single transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRows {
    /// Number of entities the batch covers
    pub entity_count: usize,

    pub new_genres: Vec<NamedRef>,
    pub new_categories: Vec<NamedRef>,
    pub new_tags: Vec<NamedRef>,

    pub genre_links: Vec<LinkRow>,
    pub category_links: Vec<LinkRow>,
    pub tag_links: Vec<TagLinkRow>,

    pub prices: Vec<PriceRow>,

    /// Entities whose detail fetch resolved to NoData
    pub no_data: Vec<EntityId>,

    /// Entities with usable details but no store tags
    pub no_tags: Vec<EntityId>,
}

impl BatchRows {
    /// Reference rows of the given kind first seen in this batch
    pub fn new_references(&self, kind: ReferenceKind) -> &[NamedRef] {
        match kind {
            ReferenceKind::Genre => &self.new_genres,
            ReferenceKind::Category => &self.new_categories,
            ReferenceKind::Tag => &self.new_tags,
        }
    }

    /// Total number of link rows across all kinds
    pub fn link_count(&self) -> usize {
        self.genre_links.len() + self.category_links.len() + self.tag_links.len()
    }
}

/// The `no_data*` flags of one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDataFlags {
    pub no_data: bool,
    pub no_data_details: bool,
    pub no_data_tags: bool,
}
