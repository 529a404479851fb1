//! Pipeline driver - the batch loop
//!
//! This module runs one ingestion pass over the pending frontier:
//! - Resolving the checkpoint from the store
//! - Fetching each batch with pacing between fetches
//! - Accumulating and committing each batch atomically
//! - Pacing between batches and stopping on the first fatal error
//!
//! A run keeps no state of its own beyond the store, so a run that ends in
//! `Aborted` is resumed by simply running again.

use crate::config::{Config, IngestConfig};
use crate::ingest::accumulator::accumulate;
use crate::ingest::checkpoint::resolve_checkpoint;
use crate::ingest::fetcher::Fetcher;
use crate::ingest::retry::{sleep_or_cancel, RetryPolicy};
use crate::ingest::state::RunState;
use crate::ingest::writer::commit_batch;
use crate::model::{EntityId, FetchOutcome, IdRange};
use crate::source::{build_http_client, DetailSource, StoreApi};
use crate::storage::{open_storage, SqliteStorage, Storage};
use crate::IngestError;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Knobs of the batch loop
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub inter_fetch_delay: Duration,
    pub inter_batch_delay: Duration,
    pub retry: RetryPolicy,
    pub fetch_tags: bool,
    pub id_range: Option<IdRange>,
}

impl PipelineSettings {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            inter_fetch_delay: config.inter_fetch_delay(),
            inter_batch_delay: config.inter_batch_delay(),
            retry: RetryPolicy::from_config(config),
            fetch_tags: config.fetch_tags,
            id_range: config.id_range,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Entities in the (possibly partitioned) frontier
    pub frontier_size: usize,

    /// Entities already processed when the run started
    pub already_processed: usize,

    pub batches_committed: usize,
    pub entities_processed: usize,
    pub no_data: usize,
    pub new_references: usize,
    pub links_written: usize,
    pub prices_written: usize,
    pub final_state: RunState,
}

impl RunReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            frontier_size: 0,
            already_processed: 0,
            batches_committed: 0,
            entities_processed: 0,
            no_data: 0,
            new_references: 0,
            links_written: 0,
            prices_written: 0,
            final_state: RunState::Init,
        }
    }

    /// True when the run committed nothing
    pub fn is_noop(&self) -> bool {
        self.batches_committed == 0
    }
}

/// What a run would do, without fetching anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub frontier_size: usize,
    pub processed: usize,
    pub pending: usize,
    pub batches: usize,
    pub first_pending: Option<EntityId>,
}

/// The ingestion pipeline
pub struct Pipeline<D, S = SqliteStorage> {
    fetcher: Fetcher<D>,
    storage: S,
    settings: PipelineSettings,
    state: RunState,
}

impl Pipeline<StoreApi, SqliteStorage> {
    /// Builds a pipeline talking to the configured HTTP source and database
    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        let client = build_http_client(&config.source)?;
        let source = StoreApi::new(client, &config.source);
        let storage = open_storage(Path::new(&config.storage.database_path))?;

        Ok(Self::new(
            source,
            storage,
            PipelineSettings::from_config(&config.ingest),
        ))
    }
}

impl<D: DetailSource, S: Storage> Pipeline<D, S> {
    pub fn new(source: D, storage: S, settings: PipelineSettings) -> Self {
        Self {
            fetcher: Fetcher::new(
                source,
                settings.retry,
                settings.fetch_tags,
                settings.inter_fetch_delay,
            ),
            storage,
            settings,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn source(&self) -> &D {
        self.fetcher.source()
    }

    /// Resolves the checkpoint and reports the work a run would do
    pub fn plan(&self) -> Result<RunPlan, IngestError> {
        let checkpoint = resolve_checkpoint(&self.storage, self.settings.id_range)?;
        let pending = checkpoint.pending_count();
        let first_pending = checkpoint.pending().next();

        Ok(RunPlan {
            frontier_size: checkpoint.frontier.len(),
            processed: checkpoint.frontier.len() - pending,
            pending,
            batches: pending.div_ceil(self.settings.batch_size.max(1)),
            first_pending,
        })
    }

    /// Runs the batch loop until the pending frontier is exhausted
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run reached `Done`
    /// * `Err(IngestError)` - The run reached `Aborted`; batches committed before the
    ///   failure stay in the store, the failing batch does not
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunReport, IngestError> {
        let mut report = RunReport::new(Utc::now());
        self.state = RunState::Init;

        match self.run_batches(&mut report, cancel).await {
            Ok(()) => {
                self.state = RunState::Done;
                report.final_state = RunState::Done;
                report.finished_at = Utc::now();
                tracing::info!(
                    "Run completed: {} entities in {} batches ({} no data, {} new references, {} links)",
                    report.entities_processed,
                    report.batches_committed,
                    report.no_data,
                    report.new_references,
                    report.links_written
                );
                Ok(report)
            }
            Err(error) => {
                self.state = RunState::Aborted;
                tracing::error!(
                    batches_committed = report.batches_committed,
                    entities_processed = report.entities_processed,
                    "Run aborted: {}",
                    error
                );
                Err(error)
            }
        }
    }

    async fn run_batches(
        &mut self,
        report: &mut RunReport,
        cancel: &CancellationToken,
    ) -> Result<(), IngestError> {
        let checkpoint = resolve_checkpoint(&self.storage, self.settings.id_range)?;
        let pending: Vec<EntityId> = checkpoint.pending().collect();
        let mut registry = checkpoint.registry;

        report.frontier_size = checkpoint.frontier.len();
        report.already_processed = report.frontier_size - pending.len();

        if pending.is_empty() {
            tracing::info!("Nothing to ingest, all {} entities processed", report.frontier_size);
            return Ok(());
        }

        let batch_size = self.settings.batch_size.max(1);
        let total_batches = pending.len().div_ceil(batch_size);
        tracing::info!(
            "Ingesting {} entities in {} batches of up to {}",
            pending.len(),
            total_batches,
            batch_size
        );

        let start_time = Instant::now();

        for (index, batch) in pending.chunks(batch_size).enumerate() {
            self.state = RunState::FetchingBatch;
            let mut outcomes: Vec<(EntityId, FetchOutcome)> = Vec::with_capacity(batch.len());

            for (position, &id) in batch.iter().enumerate() {
                if position > 0 {
                    sleep_or_cancel(self.settings.inter_fetch_delay, cancel).await?;
                }
                let outcome = self.fetcher.fetch(id, cancel).await?;
                outcomes.push((id, outcome));
            }

            // A batch fetched after cancellation is dropped, not committed
            if cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            self.state = RunState::WritingBatch;
            let rows = accumulate(&mut registry, &outcomes);
            commit_batch(&mut self.storage, &rows)?;

            report.batches_committed += 1;
            report.entities_processed += rows.entity_count;
            report.no_data += rows.no_data.len();
            report.new_references +=
                rows.new_genres.len() + rows.new_categories.len() + rows.new_tags.len();
            report.links_written += rows.link_count();
            report.prices_written += rows.prices.len();

            let elapsed = start_time.elapsed();
            let rate = report.entities_processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: batch {}/{}, {} entities processed, {} remaining, {:.2} entities/sec",
                index + 1,
                total_batches,
                report.entities_processed,
                pending.len() - report.entities_processed,
                rate
            );

            if index + 1 == total_batches {
                break;
            }

            self.state = RunState::Pacing;
            sleep_or_cancel(self.settings.inter_batch_delay, cancel).await?;
        }

        Ok(())
    }
}
