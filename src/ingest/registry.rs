//! In-memory dedup sets for reference data
//!
//! Seeded from the store at the start of a run and updated as new reference
//! ids are admitted. Nothing here is persisted directly: admitted ids reach the
//! store only through a committed batch. After a failed commit the run stops,
//! so a registry never outlives a rolled-back batch.

use crate::model::ReferenceKind;
use std::collections::HashSet;

/// Known reference ids, one independent set per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRegistry {
    genres: HashSet<i64>,
    categories: HashSet<i64>,
    tags: HashSet<i64>,
}

impl ReferenceRegistry {
    pub fn new(genres: HashSet<i64>, categories: HashSet<i64>, tags: HashSet<i64>) -> Self {
        Self {
            genres,
            categories,
            tags,
        }
    }

    fn set(&self, kind: ReferenceKind) -> &HashSet<i64> {
        match kind {
            ReferenceKind::Genre => &self.genres,
            ReferenceKind::Category => &self.categories,
            ReferenceKind::Tag => &self.tags,
        }
    }

    fn set_mut(&mut self, kind: ReferenceKind) -> &mut HashSet<i64> {
        match kind {
            ReferenceKind::Genre => &mut self.genres,
            ReferenceKind::Category => &mut self.categories,
            ReferenceKind::Tag => &mut self.tags,
        }
    }

    /// Records `id` as known; returns true if it was not known before
    ///
    /// A true result means the caller must queue an insert for the reference row.
    pub fn admit(&mut self, kind: ReferenceKind, id: i64) -> bool {
        self.set_mut(kind).insert(id)
    }

    pub fn contains(&self, kind: ReferenceKind, id: i64) -> bool {
        self.set(kind).contains(&id)
    }

    /// Number of known ids of a kind
    pub fn len(&self, kind: ReferenceKind) -> usize {
        self.set(kind).len()
    }
}
