//! Integration tests for the ingestion pipeline
//!
//! These tests use wiremock to stand in for the detail API, the store pages
//! and the catalog endpoint, and run the pipeline end-to-end against a
//! SQLite database file in a temporary directory.

use catalog_ingest::config::SourceConfig;
use catalog_ingest::ingest::{load_catalog, Pipeline, PipelineSettings, RetryPolicy, RunState};
use catalog_ingest::model::ReferenceKind;
use catalog_ingest::source::{build_http_client, StoreApi};
use catalog_ingest::storage::{SqliteStorage, Storage};
use catalog_ingest::IngestError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG: &str = r#"{"applist": {"apps": [
    {"appid": 1, "name": "First"},
    {"appid": 2, "name": "Second"},
    {"appid": 3, "name": "Third"},
    {"appid": 1, "name": "First again"}
]}}"#;

const TAG_PAGE: &str = r#"<html><body>
    <div class="app_tag_control" data-tagid="1662"><a class="app_tag">Survival</a></div>
    <div class="app_tag_control" data-tagid="1695"><a class="app_tag">Open World</a></div>
</body></html>"#;

fn source_config(base: &str) -> SourceConfig {
    SourceConfig {
        details_url: format!("{}/api/appdetails", base),
        store_page_url: format!("{}/app", base),
        app_list_url: format!("{}/apps", base),
        country_code: "ru".to_string(),
        language: None,
        user_agent: "IngestTest/1.0".to_string(),
        request_timeout_seconds: 5,
    }
}

fn store_api(base: &str) -> StoreApi {
    let config = source_config(base);
    StoreApi::new(build_http_client(&config).expect("client"), &config)
}

fn settings(batch_size: usize) -> PipelineSettings {
    PipelineSettings {
        batch_size,
        inter_fetch_delay: Duration::ZERO,
        inter_batch_delay: Duration::ZERO,
        retry: RetryPolicy::immediate(2),
        fetch_tags: true,
        id_range: None,
    }
}

fn detail_body(id: i64, genre_id: &str, genre: &str, price: i64) -> String {
    format!(
        r#"{{"{id}": {{"success": true, "data": {{
            "genres": [{{"id": "{genre_id}", "description": "{genre}"}}],
            "categories": [{{"id": 2, "description": "Single-player"}}],
            "is_free": false,
            "price_overview": {{"currency": "RUB", "initial": {price}, "final": {price}}}
        }}}}}}"#
    )
}

async fn mount_detail(server: &MockServer, id: i64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/appdetails"))
        .and(query_param("appids", id.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG))
        .mount(server)
        .await;
}

/// Entity 1 has details and tags, 2 has no data, 3 always fails
async fn mount_scenario(server: &MockServer) {
    mount_catalog(server).await;

    mount_detail(
        server,
        1,
        ResponseTemplate::new(200).set_body_string(detail_body(1, "10", "Action", 500)),
    )
    .await;
    mount_detail(
        server,
        2,
        ResponseTemplate::new(200).set_body_string(r#"{"2": {"success": false}}"#),
    )
    .await;
    mount_detail(server, 3, ResponseTemplate::new(503)).await;

    Mock::given(method("GET"))
        .and(path("/app/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TAG_PAGE))
        .mount(server)
        .await;
}

/// Creates a database with the catalog loaded from the mock server
async fn seeded_database(server: &MockServer, dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("catalog.db");
    let mut storage = SqliteStorage::new(&db_path).expect("open database");

    let report = load_catalog(
        &store_api(&server.uri()),
        &mut storage,
        &RetryPolicy::immediate(1),
        &CancellationToken::new(),
    )
    .await
    .expect("catalog load");
    assert_eq!(report.fetched, 4);
    assert_eq!(report.inserted, 3);

    db_path
}

fn pipeline(server: &MockServer, db_path: &Path, batch_size: usize) -> Pipeline<StoreApi> {
    let storage = SqliteStorage::new(db_path).expect("open database");
    Pipeline::new(store_api(&server.uri()), storage, settings(batch_size))
}

#[tokio::test]
async fn test_batch_of_one_keeps_entities_before_failure() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = seeded_database(&server, &dir).await;

    let mut pipeline = pipeline(&server, &db_path, 1);
    let result = pipeline.run(&CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(IngestError::FetchExhausted { id: 3, attempts: 2, .. })
    ));
    assert_eq!(pipeline.state(), RunState::Aborted);

    let storage = pipeline.storage();
    assert_eq!(
        storage.reference_name(ReferenceKind::Genre, 10).unwrap(),
        Some("Action".to_string())
    );
    assert_eq!(storage.price_for(1).unwrap(), Some(500));
    assert!(storage.no_data_flags(2).unwrap().no_data);

    let processed = storage.processed_entity_ids().unwrap();
    assert!(processed.contains(&1));
    assert!(processed.contains(&2));
    assert!(!processed.contains(&3));
}

#[tokio::test]
async fn test_shared_batch_is_rolled_back_on_failure() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = seeded_database(&server, &dir).await;

    let mut pipeline = pipeline(&server, &db_path, 3);
    let result = pipeline.run(&CancellationToken::new()).await;
    assert!(matches!(result, Err(IngestError::FetchExhausted { id: 3, .. })));

    let storage = pipeline.storage();
    assert!(storage.processed_entity_ids().unwrap().is_empty());
    assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 0);
    assert!(!storage.no_data_flags(2).unwrap().no_data);
}

#[tokio::test]
async fn test_resumed_run_fetches_only_the_remainder() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = seeded_database(&server, &dir).await;

    let first = pipeline(&server, &db_path, 1).run(&CancellationToken::new()).await;
    assert!(first.is_err());

    server.reset().await;
    mount_detail(
        &server,
        3,
        ResponseTemplate::new(200).set_body_string(detail_body(3, "10", "Экшен", 0)),
    )
    .await;

    let mut resumed = pipeline(&server, &db_path, 1);
    let report = resumed.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.already_processed, 2);
    assert_eq!(report.entities_processed, 1);
    assert_eq!(report.final_state, RunState::Done);

    let requests = server.received_requests().await.unwrap();
    let detail_requests = requests
        .iter()
        .filter(|r| r.url.path() == "/api/appdetails")
        .count();
    assert_eq!(detail_requests, 1);

    // Reference names are never overwritten
    let storage = resumed.storage();
    assert_eq!(
        storage.reference_name(ReferenceKind::Genre, 10).unwrap(),
        Some("Action".to_string())
    );
    assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 1);
    assert_eq!(storage.count_references(ReferenceKind::Category).unwrap(), 1);
    assert_eq!(storage.linked_references(ReferenceKind::Genre, 3).unwrap(), vec![10]);
    assert_eq!(storage.price_for(3).unwrap(), Some(0));
}

#[tokio::test]
async fn test_completed_run_is_idempotent() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    mount_detail(
        &server,
        1,
        ResponseTemplate::new(200).set_body_string(detail_body(1, "10", "Action", 500)),
    )
    .await;
    mount_detail(
        &server,
        2,
        ResponseTemplate::new(200).set_body_string(r#"{"2": {"success": true, "data": {}}}"#),
    )
    .await;
    mount_detail(
        &server,
        3,
        ResponseTemplate::new(200).set_body_string(detail_body(3, "23", "Indie", 99)),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let db_path = seeded_database(&server, &dir).await;

    let first = pipeline(&server, &db_path, 2)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.entities_processed, 3);
    assert_eq!(first.batches_committed, 2);
    assert_eq!(first.no_data, 1);

    let requests_after_first = server.received_requests().await.unwrap().len();

    let mut second = pipeline(&server, &db_path, 2);
    let report = second.run(&CancellationToken::new()).await.unwrap();
    assert!(report.is_noop());
    assert_eq!(report.final_state, RunState::Done);
    assert_eq!(server.received_requests().await.unwrap().len(), requests_after_first);

    let storage = second.storage();
    assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 2);
    assert_eq!(storage.count_prices().unwrap(), 2);
    assert!(storage.no_data_flags(2).unwrap().no_data_details);
}

#[tokio::test]
async fn test_failed_commit_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = seeded_database(&server, &dir).await;

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_price BEFORE INSERT ON apps_prices
         BEGIN SELECT RAISE(ABORT, 'price rejected'); END;",
    )
    .unwrap();

    let mut pipeline = pipeline(&server, &db_path, 1);
    let result = pipeline.run(&CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(IngestError::CommitFailed { entities: 1, .. })
    ));

    let storage = pipeline.storage();
    assert!(storage.processed_entity_ids().unwrap().is_empty());
    assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 0);
    assert_eq!(storage.count_references(ReferenceKind::Tag).unwrap(), 0);
    assert_eq!(storage.count_links(ReferenceKind::Tag).unwrap(), 0);
}

#[tokio::test]
async fn test_store_page_tags_keep_their_order() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = seeded_database(&server, &dir).await;

    let mut pipeline = pipeline(&server, &db_path, 1);
    let result = pipeline.run(&CancellationToken::new()).await;
    assert!(matches!(result, Err(IngestError::FetchExhausted { id: 3, .. })));

    let storage = pipeline.storage();
    assert_eq!(storage.tag_links_for(1).unwrap(), vec![(1662, 0), (1695, 1)]);
    assert_eq!(
        storage.reference_name(ReferenceKind::Tag, 1695).unwrap(),
        Some("Open World".to_string())
    );
    assert!(!storage.no_data_flags(1).unwrap().no_data_tags);
}
