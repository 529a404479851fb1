//! Statistics over the ingestion database
//!
//! This module provides functionality for extracting and displaying
//! ingestion progress from the storage layer.

use crate::model::ReferenceKind;
use crate::storage::Storage;
use crate::IngestError;

/// Ingestion statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestStatistics {
    /// Total number of catalog entities
    pub total_entities: u64,

    /// Entities whose processing has been committed
    pub processed: u64,

    /// Entities flagged as having no data
    pub no_data: u64,

    /// Entities with details but no store tags
    pub no_tags: u64,

    /// Reference rows per kind
    pub references: Vec<(ReferenceKind, u64)>,

    /// Link rows per kind
    pub links: Vec<(ReferenceKind, u64)>,

    pub prices: u64,
}

impl IngestStatistics {
    /// Entities not yet processed
    pub fn pending(&self) -> u64 {
        self.total_entities.saturating_sub(self.processed)
    }

    /// Share of the catalog already processed, in percent
    pub fn completion(&self) -> f64 {
        if self.total_entities == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total_entities as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(IngestStatistics)` - Successfully loaded statistics
/// * `Err(IngestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<IngestStatistics, IngestError> {
    let mut references = Vec::new();
    let mut links = Vec::new();
    for kind in ReferenceKind::all() {
        references.push((kind, storage.count_references(kind)?));
        links.push((kind, storage.count_links(kind)?));
    }

    Ok(IngestStatistics {
        total_entities: storage.count_entities()?,
        processed: storage.processed_entity_ids()?.len() as u64,
        no_data: storage.count_no_data()?,
        no_tags: storage.count_no_tags()?,
        references,
        links,
        prices: storage.count_prices()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IngestStatistics) {
    println!("=== Ingestion Statistics ===\n");

    println!("Catalog:");
    println!("  Total entities: {}", stats.total_entities);
    println!(
        "  Processed: {} ({:.1}%)",
        stats.processed,
        stats.completion()
    );
    println!("  Pending: {}", stats.pending());
    println!("  No data: {}", stats.no_data);
    println!("  No tags: {}", stats.no_tags);
    println!();

    println!("Reference Data:");
    for (kind, count) in &stats.references {
        println!("  {}: {}", kind, count);
    }
    println!();

    println!("Links:");
    for (kind, count) in &stats.links {
        println!("  {}: {}", kind, count);
    }
    println!("  prices: {}", stats.prices);
}
