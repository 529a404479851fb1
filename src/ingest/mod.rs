//! Incremental batch ingestion
//!
//! This module contains the pipeline and its stages:
//! - `checkpoint`: derives processed entities and known references from the store
//! - `fetcher` and `retry`: per-entity fetch with bounded retry
//! - `registry`: in-memory reference dedup sets
//! - `accumulator`: builds the rows of one batch
//! - `writer`: commits a batch atomically
//! - `driver`: the batch loop and its state machine
//! - `catalog`: the standalone catalog load step

mod accumulator;
mod catalog;
mod checkpoint;
mod driver;
mod fetcher;
mod registry;
mod retry;
mod state;
mod writer;

#[cfg(test)]
mod testing;

pub use accumulator::accumulate;
pub use catalog::{load_catalog, CatalogReport};
pub use checkpoint::{resolve_checkpoint, Checkpoint};
pub use driver::{Pipeline, PipelineSettings, RunPlan, RunReport};
pub use fetcher::Fetcher;
pub use registry::ReferenceRegistry;
pub use retry::{sleep_or_cancel, with_retry, RetryError, RetryPolicy};
pub use state::RunState;
pub use writer::commit_batch;
