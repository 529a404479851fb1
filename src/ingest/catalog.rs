//! Standalone catalog load step
//!
//! Seeds the `apps` table from the catalog capability. Not part of the batch
//! loop; run it once before the first ingestion and again whenever the
//! catalog has grown.

use crate::ingest::retry::{with_retry, RetryError, RetryPolicy};
use crate::model::Entity;
use crate::source::CatalogSource;
use crate::storage::Storage;
use crate::IngestError;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Counts from one catalog load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogReport {
    /// Entries returned by the source
    pub fetched: usize,

    /// Entries left after dropping repeated ids
    pub unique: usize,

    /// Entities not previously in the store
    pub inserted: usize,
}

/// Fetches the catalog and inserts entities not already stored
///
/// When the source lists an id more than once, its first name is kept.
pub async fn load_catalog<C, S>(
    source: &C,
    storage: &mut S,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<CatalogReport, IngestError>
where
    C: CatalogSource + ?Sized,
    S: Storage + ?Sized,
{
    tracing::info!("Fetching catalog");
    let entities = with_retry(policy, cancel, || source.fetch_catalog())
        .await
        .map_err(|error| match error {
            RetryError::Exhausted { last, .. } => IngestError::Catalog(last),
            RetryError::Fatal(source) => IngestError::Catalog(source),
            RetryError::Cancelled => IngestError::Cancelled,
        })?;

    let fetched = entities.len();
    let unique = dedup_first(entities);
    let inserted = storage.insert_entities(&unique)?;

    let report = CatalogReport {
        fetched,
        unique: unique.len(),
        inserted,
    };
    tracing::info!(
        "Catalog loaded: {} fetched, {} unique, {} new",
        report.fetched,
        report.unique,
        report.inserted
    );

    Ok(report)
}

fn dedup_first(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities
        .into_iter()
        .filter(|entity| seen.insert(entity.id))
        .collect()
}
