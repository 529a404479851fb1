//! Domain model for the ingestion pipeline
//!
//! # Components
//!
//! - `Entity`: a catalog item (id + display name), loaded once by the catalog step
//! - `DetailRecord` / `FetchOutcome`: the result of fetching one entity's details
//! - `ReferenceKind`: the three independent reference sets (genres, categories, tags)
//! - `IdRange`: optional partition of the entity id space

mod detail;
mod entity;

pub use detail::{DetailRecord, FetchOutcome, NamedRef, TagRef};
pub use entity::{Entity, EntityId, IdRange, ReferenceKind};
