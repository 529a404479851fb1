//! HTTP implementation of the detail and catalog capabilities
//!
//! Talks to three endpoints:
//! - the detail API (`?appids=<id>&cc=<country>`), returning JSON keyed by id
//! - the entity's store page, scraped for tags
//! - the catalog endpoint, returning every known entity

use crate::config::SourceConfig;
use crate::model::{DetailRecord, Entity, EntityId, FetchOutcome, NamedRef, TagRef};
use crate::source::tags::parse_store_tags;
use crate::source::{CatalogSource, DetailSource, SourceError};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

/// Skips the store's age gate so tag sections are rendered
const AGE_GATE_COOKIE: &str = "birthtime=0; lastagecheckage=1-0-1900; mature_content=1";

#[derive(Debug, Deserialize)]
struct AppDetailsEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    #[serde(default)]
    genres: Vec<RawReference>,
    #[serde(default)]
    categories: Vec<RawReference>,
    #[serde(default)]
    is_free: bool,
    price_overview: Option<PriceOverview>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    id: RawId,
    description: String,
}

/// Genre ids arrive as strings, category ids as numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn to_id(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(rename = "final")]
    final_price: i64,
}

#[derive(Debug, Deserialize)]
struct AppListResponse {
    applist: AppList,
}

#[derive(Debug, Deserialize)]
struct AppList {
    apps: Vec<AppListEntry>,
}

#[derive(Debug, Deserialize)]
struct AppListEntry {
    appid: EntityId,
    #[serde(default)]
    name: String,
}

/// HTTP-backed detail and catalog source
pub struct StoreApi {
    client: Client,
    details_url: String,
    store_page_url: String,
    app_list_url: String,
    country_code: String,
    language: Option<String>,
}

impl StoreApi {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            details_url: config.details_url.clone(),
            store_page_url: config.store_page_url.trim_end_matches('/').to_string(),
            app_list_url: config.app_list_url.clone(),
            country_code: config.country_code.clone(),
            language: config.language.clone(),
        }
    }
}

/// Sends a request and returns the status and body
///
/// Transport failures are transient; status handling is left to the caller.
async fn fetch_text(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<(StatusCode, String), SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::transient(url, describe_transport_error(&e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SourceError::transient(url, format!("failed to read body: {}", e)))?;

    Ok((status, body))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

/// Converts a detail API body into an outcome for `id`
fn parse_details(id: EntityId, body: &str, url: &str) -> Result<FetchOutcome, SourceError> {
    let mut envelopes: HashMap<String, AppDetailsEnvelope> = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(url, format!("invalid detail payload: {}", e)))?;

    let envelope = envelopes
        .remove(&id.to_string())
        .ok_or_else(|| SourceError::malformed(url, format!("payload has no entry for {}", id)))?;

    let data = match envelope.data {
        Some(data) if envelope.success => data,
        _ => {
            tracing::warn!(entity_id = id, "No details for entity");
            return Ok(FetchOutcome::NoData);
        }
    };

    let genres = convert_references(&data.genres, url)?;
    let categories = convert_references(&data.categories, url)?;

    let price = if data.is_free {
        Some(0)
    } else if let Some(overview) = &data.price_overview {
        if overview.final_price < 0 {
            return Err(SourceError::malformed(
                url,
                format!("negative price {}", overview.final_price),
            ));
        }
        Some(overview.final_price)
    } else {
        tracing::warn!(entity_id = id, "No price for entity");
        None
    };

    Ok(FetchOutcome::Details(DetailRecord {
        genres,
        categories,
        tags: None,
        price,
    }))
}

fn convert_references(raw: &[RawReference], url: &str) -> Result<Vec<NamedRef>, SourceError> {
    raw.iter()
        .map(|reference| {
            reference
                .id
                .to_id()
                .map(|id| NamedRef::new(id, reference.description.trim()))
                .ok_or_else(|| {
                    SourceError::malformed(url, format!("non-numeric reference id {:?}", reference.id))
                })
        })
        .collect()
}

/// Converts a catalog body into entities, in source order
fn parse_catalog(body: &str, url: &str) -> Result<Vec<Entity>, SourceError> {
    let response: AppListResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(url, format!("invalid catalog payload: {}", e)))?;

    Ok(response
        .applist
        .apps
        .into_iter()
        .map(|app| Entity::new(app.appid, app.name))
        .collect())
}

#[async_trait]
impl DetailSource for StoreApi {
    async fn fetch_detail(&self, id: EntityId) -> Result<FetchOutcome, SourceError> {
        let request = self.client.get(&self.details_url).query(&[
            ("appids", id.to_string()),
            ("cc", self.country_code.clone()),
        ]);

        let (status, body) = fetch_text(request, &self.details_url).await?;
        if !status.is_success() {
            return Err(SourceError::transient(
                &self.details_url,
                format!("HTTP {} for entity {}", status.as_u16(), id),
            ));
        }

        parse_details(id, &body, &self.details_url)
    }

    async fn fetch_tags(&self, id: EntityId) -> Result<Vec<TagRef>, SourceError> {
        let url = format!("{}/{}/", self.store_page_url, id);
        let mut request = self.client.get(&url).header(COOKIE, AGE_GATE_COOKIE);
        if let Some(language) = &self.language {
            request = request.query(&[("l", language.as_str())]);
        }

        let (status, body) = fetch_text(request, &url).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(SourceError::transient(
                &url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        Ok(parse_store_tags(&body))
    }
}

#[async_trait]
impl CatalogSource for StoreApi {
    async fn fetch_catalog(&self) -> Result<Vec<Entity>, SourceError> {
        let request = self.client.get(&self.app_list_url);
        let (status, body) = fetch_text(request, &self.app_list_url).await?;
        if !status.is_success() {
            return Err(SourceError::transient(
                &self.app_list_url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        parse_catalog(&body, &self.app_list_url)
    }
}
