//! Entity and reference identifiers
use serde::Deserialize;
use std::fmt;

/// Opaque integer identifier of a catalog entity
pub type EntityId = i64;

/// A catalog item as loaded from the catalog source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The three independent reference sets an entity can link to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Genre,
    Category,
    Tag,
}

impl ReferenceKind {
    /// Name of the reference table holding `(id, name)` rows
    pub fn table(&self) -> &'static str {
        match self {
            Self::Genre => "genres",
            Self::Category => "categories",
            Self::Tag => "store_tags",
        }
    }

    /// Name of the entity <-> reference association table
    pub fn link_table(&self) -> &'static str {
        match self {
            Self::Genre => "apps_genres",
            Self::Category => "apps_categories",
            Self::Tag => "apps_store_tags",
        }
    }

    /// Column of the association table pointing at the reference row
    pub fn link_column(&self) -> &'static str {
        match self {
            Self::Genre => "genre_id",
            Self::Category => "category_id",
            Self::Tag => "tag_id",
        }
    }

    /// Returns all reference kinds
    pub fn all() -> [Self; 3] {
        [Self::Genre, Self::Category, Self::Tag]
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Genre => "genre",
            Self::Category => "category",
            Self::Tag => "tag",
        };
        write!(f, "{}", name)
    }
}

/// Half-open range `[start, end)` of entity ids handled by one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IdRange {
    pub start: EntityId,
    pub end: EntityId,
}

impl IdRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
