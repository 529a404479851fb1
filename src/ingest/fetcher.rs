//! Rate-limited fetcher
//!
//! Wraps a `DetailSource` with the retry policy and the NoData normalization
//! rule. The driver paces successive entities; this type paces the detail and
//! tag requests of a single entity.

use crate::ingest::retry::{sleep_or_cancel, with_retry, RetryError, RetryPolicy};
use crate::model::{EntityId, FetchOutcome};
use crate::source::DetailSource;
use crate::IngestError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Fetcher<D> {
    source: D,
    policy: RetryPolicy,
    fetch_tags: bool,
    request_gap: Duration,
}

impl<D: DetailSource> Fetcher<D> {
    /// `request_gap` is the pause between the detail and tag requests
    pub fn new(source: D, policy: RetryPolicy, fetch_tags: bool, request_gap: Duration) -> Self {
        Self {
            source,
            policy,
            fetch_tags,
            request_gap,
        }
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    /// Fetches one entity's details, retrying transient failures
    ///
    /// Records without genres, categories or price are reclassified as
    /// `NoData`. Tags are fetched only for records that survive that check.
    ///
    /// # Errors
    ///
    /// * `FetchExhausted` - every attempt failed transiently
    /// * `MalformedResponse` - the payload could not be understood
    /// * `Cancelled` - the token fired while waiting
    pub async fn fetch(
        &self,
        id: EntityId,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, IngestError> {
        let outcome = with_retry(&self.policy, cancel, || self.source.fetch_detail(id))
            .await
            .map_err(|e| into_ingest_error(id, e))?;

        let mut record = match outcome {
            FetchOutcome::NoData => {
                tracing::debug!(entity_id = id, "Entity resolved to no data");
                return Ok(FetchOutcome::NoData);
            }
            FetchOutcome::Details(record) if record.lacks_details() => {
                tracing::warn!(
                    entity_id = id,
                    "Empty genres, categories and price; treating entity as no data"
                );
                return Ok(FetchOutcome::NoData);
            }
            FetchOutcome::Details(record) => record,
        };

        if self.fetch_tags {
            sleep_or_cancel(self.request_gap, cancel).await?;
            let tags = with_retry(&self.policy, cancel, || self.source.fetch_tags(id))
                .await
                .map_err(|e| into_ingest_error(id, e))?;
            record.tags = Some(tags);
        }

        tracing::debug!(
            entity_id = id,
            genres = record.genres.len(),
            categories = record.categories.len(),
            tags = record.tags.as_ref().map_or(0, Vec::len),
            price = ?record.price,
            "Fetched entity"
        );

        Ok(FetchOutcome::classify(record))
    }
}

fn into_ingest_error(id: EntityId, error: RetryError) -> IngestError {
    match error {
        RetryError::Exhausted { attempts, last } => IngestError::FetchExhausted {
            id,
            attempts,
            source: last,
        },
        RetryError::Fatal(source) => IngestError::MalformedResponse {
            id,
            message: source.to_string(),
        },
        RetryError::Cancelled => IngestError::Cancelled,
    }
}
