//! Per-entity detail records and their classification
//!
//! A fetch either yields usable details or resolves to `NoData`, which is a
//! terminal outcome for the entity rather than an error.

/// A reference entry carried by a detail record (genre or category)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A store tag with its rank on the source page (0 = first)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub id: i64,
    pub name: String,
    pub order: u32,
}

impl TagRef {
    pub fn new(id: i64, name: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            order,
        }
    }
}

/// Details fetched for one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    pub genres: Vec<NamedRef>,
    pub categories: Vec<NamedRef>,
    /// Store tags; `None` when the store page was not queried
    pub tags: Option<Vec<TagRef>>,
    /// Final price in currency minor units; `Some(0)` for free entities
    pub price: Option<i64>,
}

impl DetailRecord {
    /// True when genres and categories are empty and no price is known
    ///
    /// Tags are deliberately not considered: records like this are reclassified
    /// as `NoData` even if the source reported success.
    pub fn lacks_details(&self) -> bool {
        self.genres.is_empty() && self.categories.is_empty() && self.price.is_none()
    }
}

/// Result of fetching one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The source returned usable details
    Details(DetailRecord),

    /// The source has nothing usable for this entity; never fetched again
    NoData,
}

impl FetchOutcome {
    /// Classifies a parsed record, reclassifying detail-less records as `NoData`
    pub fn classify(record: DetailRecord) -> Self {
        if record.lacks_details() {
            Self::NoData
        } else {
            Self::Details(record)
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}
