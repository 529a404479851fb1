//! External sources the pipeline reads from
//!
//! This module contains the collaborators the pipeline talks to, including:
//! - Building the shared HTTP client
//! - The per-entity detail capability (detail API + store-page tags)
//! - The catalog capability (full entity list)
//!
//! The pipeline only depends on the `DetailSource` and `CatalogSource` traits,
//! so tests can substitute scripted sources.

mod client;
mod store_api;
mod tags;

pub use client::build_http_client;
pub use store_api::StoreApi;
pub use tags::parse_store_tags;

use crate::model::{Entity, EntityId, FetchOutcome, TagRef};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by an external source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout, or non-success status; worth retrying
    #[error("Transient failure for {url}: {message}")]
    Transient { url: String, message: String },

    /// The source answered but the payload could not be understood
    #[error("Malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl SourceError {
    pub fn transient(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Returns true if the request may succeed when repeated
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Per-entity detail capability
///
/// `fetch_detail` returns the record as the source reported it; classifying
/// detail-less records as `NoData` is left to the caller.
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Fetches genres, categories and price for one entity
    async fn fetch_detail(&self, id: EntityId) -> Result<FetchOutcome, SourceError>;

    /// Fetches store tags for one entity, in page order
    async fn fetch_tags(&self, id: EntityId) -> Result<Vec<TagRef>, SourceError>;
}

#[async_trait]
impl<T: DetailSource + ?Sized> DetailSource for Arc<T> {
    async fn fetch_detail(&self, id: EntityId) -> Result<FetchOutcome, SourceError> {
        (**self).fetch_detail(id).await
    }

    async fn fetch_tags(&self, id: EntityId) -> Result<Vec<TagRef>, SourceError> {
        (**self).fetch_tags(id).await
    }
}

/// Catalog capability: the full list of known entities
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Entity>, SourceError>;
}
