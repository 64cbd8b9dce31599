//! Integration tests for the HTTP record source, record store refresh, and
//! chart configuration persistence working together.

use std::sync::Arc;
use std::time::Duration;

use rollcall_core::{Error, FilterPatch, FilterSpecification, RecordSource};
use rollcall_store::{
    ChartBlobStore, ChartConfigurationStore, FileBlobStore, HttpRecordSource, RecordStore,
    RefreshOutcome,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn workshops() -> serde_json::Value {
    json!([
        {
            "id": 1,
            "title": "Intro to Git",
            "presenter": "J. Doe",
            "description": "Version control",
            "tags": ["git", "tools"],
            "start": "2024-02-01T09:00:00Z",
            "end": "2024-02-01T11:00:00Z",
            "seats": 20,
            "seatsTaken": 15,
            "attendance": 10
        },
        {
            "id": 2,
            "title": "Advanced Python",
            "presenter": null,
            "description": null,
            "tags": ["python"],
            "start": "2024-02-02T13:00:00Z",
            "end": "2024-02-02T15:00:00Z",
            "seats": 30,
            "seats_taken": 30,
            "attendance": 0
        }
    ])
}

#[tokio::test]
async fn test_http_source_fetches_records() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/workshop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workshops()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpRecordSource::new(format!("{}/data/workshop", mock_server.uri()), 5)
        .expect("Failed to create source");
    let records = source.fetch_records().await.expect("fetch should succeed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].seats_taken, 15);
    assert!(records[1].presenter.is_empty());
}

#[tokio::test]
async fn test_http_source_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let source = HttpRecordSource::new(mock_server.uri(), 5).unwrap();
    let err = source.fetch_records().await.unwrap_err();
    match err {
        Error::Source(msg) => assert!(msg.contains("503"), "unexpected message: {}", msg),
        other => panic!("expected source error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_feeds_chart_store() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/workshop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workshops()))
        .mount(&mock_server)
        .await;

    let source =
        HttpRecordSource::new(format!("{}/data/workshop", mock_server.uri()), 5).unwrap();
    let store = RecordStore::new(Arc::new(source));

    let outcome = store.refresh().await.unwrap();
    assert!(outcome.is_installed());
    let throttled = store
        .refresh_if_due(Duration::from_secs(86_400))
        .await
        .unwrap();
    assert!(matches!(throttled, RefreshOutcome::Throttled { .. }));

    let snapshot = store.snapshot().await;
    let mut charts = ChartConfigurationStore::new(snapshot.records, snapshot.generation);
    let view = charts.update_active_spec(&FilterPatch {
        drop: Some(true),
        ..Default::default()
    });
    assert_eq!(view.dataset.labels, vec!["Intro to Git"]);
    assert_eq!(view.table.hidden, vec![2]);
}

#[tokio::test]
async fn test_save_and_load_through_file_blob_store() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FileBlobStore::new(dir.path().join("charts.json"));

    let records = Arc::new(Vec::new());
    let mut charts = ChartConfigurationStore::new(records.clone(), 0);
    charts.create_slot(FilterSpecification::new().with_tags("python").categorized(true));
    blobs
        .save(&charts.serialize().encode().unwrap())
        .await
        .unwrap();

    let mut reloaded = ChartConfigurationStore::new(records, 0);
    let saved = blobs.load().await.unwrap();
    assert!(reloaded.restore(saved.as_deref()));
    assert_eq!(reloaded.serialize(), charts.serialize());
    assert_eq!(reloaded.active_id(), "chart");
}
