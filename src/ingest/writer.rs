//! Transactional writer
//!
//! A batch is committed in a single store transaction; a failure leaves no row
//! of the batch behind.

use crate::storage::{BatchRows, Storage};
use crate::IngestError;

/// Commits one batch atomically
///
/// # Errors
///
/// * `CommitFailed` - the transaction was rolled back; nothing from `rows` was written
pub fn commit_batch<S: Storage + ?Sized>(storage: &mut S, rows: &BatchRows) -> Result<(), IngestError> {
    if let Err(source) = storage.commit_batch(rows) {
        tracing::error!(entities = rows.entity_count, "Batch commit rolled back: {}", source);
        return Err(IngestError::CommitFailed {
            entities: rows.entity_count,
            source,
        });
    }

    tracing::debug!(
        entities = rows.entity_count,
        new_genres = rows.new_genres.len(),
        new_categories = rows.new_categories.len(),
        new_tags = rows.new_tags.len(),
        links = rows.link_count(),
        prices = rows.prices.len(),
        no_data = rows.no_data.len(),
        "Committed batch"
    );

    Ok(())
}
