use crate::model::IdRange;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Ingest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ingest: IngestConfig,
    pub source: SourceConfig,
    pub storage: StorageConfig,
}

/// Batch loop and pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IngestConfig {
    /// Number of entities fetched and committed together
    pub batch_size: usize,

    /// Pause between two successive detail fetches (seconds)
    pub inter_fetch_delay_seconds: f64,

    /// Pause between two committed batches (seconds)
    pub inter_batch_delay_seconds: f64,

    /// Attempts per entity before a transient failure becomes fatal
    pub max_fetch_attempts: u32,

    /// Delay before the first retry (seconds)
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_seconds: f64,

    /// Upper bound on any retry delay (seconds)
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_seconds: f64,

    #[serde(default)]
    pub retry_strategy: RetryStrategy,

    /// Whether to scrape store-page tags for each entity
    #[serde(default = "default_true")]
    pub fetch_tags: bool,

    /// Restricts this instance to a partition of the id space
    #[serde(default)]
    pub id_range: Option<IdRange>,
}

impl IngestConfig {
    pub fn inter_fetch_delay(&self) -> Duration {
        Duration::from_secs_f64(self.inter_fetch_delay_seconds)
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_secs_f64(self.inter_batch_delay_seconds)
    }
}

/// How the delay between retries grows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    Fixed,
    #[default]
    Exponential,
}

/// External source endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Detail endpoint, queried with `?appids=<id>&cc=<country>`
    pub details_url: String,

    /// Store page base; the entity id is appended as a path segment
    pub store_page_url: String,

    /// Catalog endpoint returning the full entity list
    pub app_list_url: String,

    /// Country code controlling price currency
    pub country_code: String,

    /// Store page language for tag names
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

fn default_retry_base_delay() -> f64 {
    1.0
}

fn default_retry_max_delay() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("catalog-ingest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}
