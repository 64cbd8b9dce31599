//! rollcall-api - HTTP API server for the rollcall workshop dashboard.

mod config;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use rollcall_store::{ChartBlobStore, FileBlobStore, RecordStore};

use config::ApiConfig;
use handlers::{charts, records, AppState};

/// UUIDv7 request ids, time-ordered so they sort with the logs.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

fn app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(records::health))
        .route("/data/workshop", get(records::workshop_records))
        .route("/refresh", post(records::refresh))
        .route("/charts", get(charts::list_charts).post(charts::create_chart))
        .route("/charts/active", put(charts::set_active))
        .route("/charts/active/filters", patch(charts::update_filters))
        .route("/charts/active/dataset", get(charts::active_dataset))
        .route("/charts/active/table", get(charts::active_table))
        .route("/charts/save", post(charts::save_charts))
        .route("/charts/load", post(charts::load_charts))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins(allowed_origins)))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rollcall_api=debug,rollcall_store=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("rollcall-api.log");
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(file_dir, file_name));

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
        } else {
            // files get plain text unless LOG_ANSI says otherwise
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ApiConfig::from_env()?;
    config.validate()?;

    let store = Arc::new(RecordStore::new(config.record_source()?));
    info!(source = %store.source_description(), "Record source configured");
    if let Err(e) = store.refresh().await {
        warn!(error = %e, "Initial record refresh failed, serving an empty snapshot");
    }

    let blobs: Arc<dyn ChartBlobStore> = Arc::new(FileBlobStore::new(&config.charts_file));
    let state = AppState::new(store, blobs, config.refresh_min_interval).await;

    match state.blobs.load().await {
        Ok(saved) => {
            state.charts.lock().await.restore(saved.as_deref());
        }
        Err(e) => warn!(
            error = %e,
            location = %state.blobs.describe(),
            "Could not read saved chart configuration"
        ),
    }

    let app = app(state, &config.allowed_origins);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use rollcall_store::{JsonFileRecordSource, MemoryBlobStore};
    use serde_json::{json, Value};

    fn workshop(id: i64, title: &str, tags: &[&str], day: u32, attendance: u64) -> Value {
        json!({
            "id": id,
            "title": title,
            "presenter": "Staff",
            "description": "",
            "tags": tags,
            "start": format!("2024-03-{:02}T09:00:00Z", day),
            "end": format!("2024-03-{:02}T11:00:00Z", day),
            "seats": 20,
            "seatsTaken": 16,
            "attendance": attendance
        })
    }

    fn workshops() -> Value {
        json!([
            workshop(1, "Intro to Git", &["git", "tools"], 4, 12),
            workshop(2, "Advanced Python", &["python"], 6, 0),
            workshop(3, "Python Plotting", &["python"], 5, 8),
        ])
    }

    struct TestServer {
        base_url: String,
        records_file: PathBuf,
        client: reqwest::Client,
        _dir: tempfile::TempDir,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        async fn get(&self, path: &str) -> reqwest::Response {
            self.client.get(self.url(path)).send().await.unwrap()
        }

        async fn post(&self, path: &str) -> reqwest::Response {
            self.client.post(self.url(path)).send().await.unwrap()
        }

        async fn patch_filters(&self, patch: Value) -> Value {
            let response = self
                .client
                .patch(self.url("/charts/active/filters"))
                .json(&patch)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
            response.json().await.unwrap()
        }
    }

    async fn spawn_test_server(records: Value, refresh_min_interval: Duration) -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let records_file = dir.path().join("workshops.json");
        std::fs::write(&records_file, records.to_string()).unwrap();

        let store = Arc::new(RecordStore::new(Arc::new(JsonFileRecordSource::new(
            &records_file,
        ))));
        store.refresh().await.unwrap();
        let state = AppState::new(
            store,
            Arc::new(MemoryBlobStore::new()),
            refresh_min_interval,
        )
        .await;
        let router = app(state, &["http://localhost:3000".to_string()]);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{}", addr),
            records_file,
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_health_and_records() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        let response = server.get("/health").await;
        assert_eq!(response.status(), 200);
        assert!(response.headers().contains_key("x-request-id"));
        let health: Value = response.json().await.unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["generation"], 1);
        assert_eq!(health["record_count"], 3);

        let records: Value = server.get("/data/workshop").await.json().await.unwrap();
        assert_eq!(records.as_array().unwrap().len(), 3);
        assert_eq!(records[0]["seats_taken"], 16);
    }

    #[tokio::test]
    async fn test_default_chart_dataset_sorted_by_start() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        let dataset: Value = server
            .get("/charts/active/dataset")
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(
            dataset["labels"],
            json!(["Intro to Git", "Python Plotting", "Advanced Python"])
        );
        assert_eq!(dataset["attendance"], json!([12.0, 8.0, 0.0]));
        assert_eq!(dataset["metric"], "count");
    }

    #[tokio::test]
    async fn test_patch_filters_rederives_active_slot() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        let slot = server
            .patch_filters(json!({"name": "python", "drop": true}))
            .await;
        assert_eq!(slot["id"], "chart");
        assert_eq!(slot["filters"]["name"], "python");
        assert_eq!(slot["view"]["dataset"]["labels"], json!(["Python Plotting"]));
        assert_eq!(slot["view"]["table"]["visible"], json!([3]));

        let table: Value = server.get("/charts/active/table").await.json().await.unwrap();
        assert_eq!(table["hidden"], json!([1, 2]));

        // empty string clears the dimension
        let slot = server.patch_filters(json!({"name": ""})).await;
        assert!(slot["filters"].get("name").is_none());
        assert_eq!(slot["view"]["dataset"]["labels"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_categorized_percentage_chart() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        let slot = server
            .patch_filters(json!({"categorize": true, "metric": "percentage"}))
            .await;
        let dataset = &slot["view"]["dataset"];
        assert_eq!(dataset["labels"], json!(["git", "python", "tools"]));
        assert_eq!(dataset["capacity"], json!([100.0, 100.0, 100.0]));
        assert_eq!(dataset["categorize"], true);

        // the table lists events, never tag rows
        assert_eq!(slot["view"]["table"]["visible"], json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_create_and_switch_slots() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;
        server.patch_filters(json!({"tags": "git"})).await;

        // empty body copies the active slot's filters
        let response = server.post("/charts").await;
        assert_eq!(response.status(), 201);
        let created: Value = response.json().await.unwrap();
        assert_eq!(created["id"], "chart-1");
        assert_eq!(created["filters"]["tags"], "git");

        let response = server
            .client
            .post(server.url("/charts"))
            .json(&json!({"filters": {"date": "1709596800000-1709769600000"}}))
            .send()
            .await
            .unwrap();
        let created: Value = response.json().await.unwrap();
        assert_eq!(created["id"], "chart-2");
        assert_eq!(
            created["view"]["dataset"]["labels"],
            json!(["Python Plotting", "Advanced Python"])
        );

        let listing: Value = server.get("/charts").await.json().await.unwrap();
        assert_eq!(listing["active"], "chart-2");
        let ids: Vec<&str> = listing["charts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["chart", "chart-1", "chart-2"]);

        let response = server
            .client
            .put(server.url("/charts/active"))
            .json(&json!({"id": "chart"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let active: Value = response.json().await.unwrap();
        assert_eq!(active["view"]["dataset"]["labels"], json!(["Intro to Git"]));
    }

    #[tokio::test]
    async fn test_set_active_unknown_slot_is_404() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        let response = server
            .client
            .put(server.url("/charts/active"))
            .json(&json!({"id": "chart-42"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("chart-42"));

        let listing: Value = server.get("/charts").await.json().await.unwrap();
        assert_eq!(listing["active"], "chart");
    }

    #[tokio::test]
    async fn test_create_chart_rejects_malformed_body() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        let response = server
            .client
            .post(server.url("/charts"))
            .header("content-type", "application/json")
            .body("{\"filters\": {\"colour\": \"red\"}}")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let listing: Value = server.get("/charts").await.json().await.unwrap();
        assert_eq!(listing["charts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let server = spawn_test_server(workshops(), Duration::from_secs(3600)).await;

        // nothing saved yet
        let loaded: Value = server.post("/charts/load").await.json().await.unwrap();
        assert_eq!(loaded["restored"], false);

        server.patch_filters(json!({"drop": true})).await;
        server.post("/charts").await;
        let saved: Value = server.post("/charts/save").await.json().await.unwrap();
        assert_eq!(saved["saved"], true);
        assert_eq!(saved["slot_count"], 2);

        server
            .patch_filters(json!({"drop": false, "name": "git"}))
            .await;

        let loaded: Value = server.post("/charts/load").await.json().await.unwrap();
        assert_eq!(loaded["restored"], true);
        assert_eq!(loaded["active"], "chart");
        assert_eq!(loaded["slot_count"], 2);

        let listing: Value = server.get("/charts").await.json().await.unwrap();
        assert_eq!(listing["charts"][1]["filters"]["drop"], true);
        assert!(listing["charts"][1]["filters"].get("name").is_none());
    }

    #[tokio::test]
    async fn test_refresh_installs_and_throttles() {
        let server = spawn_test_server(workshops(), Duration::ZERO).await;

        let mut more = workshops();
        more.as_array_mut()
            .unwrap()
            .push(workshop(4, "Slurm Basics", &["slurm"], 7, 5));
        std::fs::write(&server.records_file, more.to_string()).unwrap();

        let response: Value = server.post("/refresh").await.json().await.unwrap();
        assert_eq!(response["refreshed"], true);
        assert_eq!(response["outcome"], "installed");
        assert_eq!(response["generation"], 2);

        let dataset: Value = server
            .get("/charts/active/dataset")
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(dataset["labels"].as_array().unwrap().len(), 4);

        let throttled = spawn_test_server(workshops(), Duration::from_secs(86_400)).await;
        let response: Value = throttled.post("/refresh").await.json().await.unwrap();
        assert_eq!(response["refreshed"], false);
        assert_eq!(response["outcome"], "throttled");
        assert!(response["msg"].as_str().unwrap().contains("24 hours"));
    }

    #[tokio::test]
    async fn test_refresh_source_failure_is_bad_gateway() {
        let server = spawn_test_server(workshops(), Duration::ZERO).await;
        std::fs::remove_file(&server.records_file).unwrap();

        let response = server.post("/refresh").await;
        assert_eq!(response.status(), 502);

        // previous snapshot still served
        let health: Value = server.get("/health").await.json().await.unwrap();
        assert_eq!(health["record_count"], 3);
    }

    #[test]
    fn test_parse_allowed_origins_skips_invalid() {
        let origins = parse_allowed_origins(&[
            "http://localhost:3000".to_string(),
            "bad\norigin".to_string(),
        ]);
        assert_eq!(origins, vec![HeaderValue::from_static("http://localhost:3000")]);
    }
}
