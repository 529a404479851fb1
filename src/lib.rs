//! Catalog-Ingest: incremental detail ingestion for a large external catalog
//!
//! This crate pulls per-entity detail records (genres, categories, store tags,
//! price) from a rate-limited external source and persists them into SQLite in
//! batches. Progress is never tracked in a side file: what has been processed is
//! re-derived from the store on every run, so an interrupted run can simply be
//! started again.

pub mod config;
pub mod ingest;
pub mod model;
pub mod output;
pub mod source;
pub mod storage;

use model::EntityId;
use thiserror::Error;

/// Main error type for Catalog-Ingest operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch for entity {id} failed after {attempts} attempts: {source}")]
    FetchExhausted {
        id: EntityId,
        attempts: u32,
        source: source::SourceError,
    },

    #[error("Malformed response for entity {id}: {message}")]
    MalformedResponse { id: EntityId, message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] storage::StorageError),

    #[error("Commit of batch with {entities} entities failed: {source}")]
    CommitFailed {
        entities: usize,
        source: storage::StorageError,
    },

    #[error("Catalog source error: {0}")]
    Catalog(source::SourceError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Run cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Catalog-Ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use ingest::{Pipeline, RunReport};
pub use model::{DetailRecord, Entity, FetchOutcome, ReferenceKind};
