//! Common test utilities for E2E tests
//!
//! Runs a fake Launch Library 2 / RocketLaunch.Live upstream on an
//! ephemeral port and the real router against a temporary database.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use launchsync::sync::SyncResource;
use launchsync::{AppState, config};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const LL2_PREFIX: &str = "/2.3.0";

#[derive(Default)]
struct UpstreamData {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    feed: Mutex<Vec<Value>>,
    requests: Mutex<HashMap<String, u64>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
}

/// In-process stand-in for both upstream APIs
#[derive(Clone)]
pub struct FakeUpstream {
    pub addr: String,
    data: Arc<UpstreamData>,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let data = Arc::new(UpstreamData::default());

        let app = Router::new()
            .route(&format!("{LL2_PREFIX}/:resource"), get(ll2_page))
            .route("/json/launches/next/:limit", get(feed_next))
            .with_state(data.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, data }
    }

    pub fn ll2_prefix(&self) -> String {
        format!("{}{LL2_PREFIX}", self.addr)
    }

    pub fn feed_base(&self) -> String {
        format!("{}/json", self.addr)
    }

    /// Replace the records served under an LL2 path
    pub fn set_collection(&self, path: &str, records: Vec<Value>) {
        self.data
            .collections
            .lock()
            .unwrap()
            .insert(path.to_string(), records);
    }

    pub fn set_feed(&self, launches: Vec<Value>) {
        *self.data.feed.lock().unwrap() = launches;
    }

    /// Answer every request to `path` with HTTP 500
    pub fn fail(&self, path: &str) {
        self.data.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.data.delay.lock().unwrap() = delay;
    }

    /// Requests received for an LL2 path, or "feed"
    pub fn requests(&self, path: &str) -> u64 {
        self.data
            .requests
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

fn record_request(data: &UpstreamData, key: &str) {
    *data
        .requests
        .lock()
        .unwrap()
        .entry(key.to_string())
        .or_insert(0) += 1;
}

async fn ll2_page(
    State(data): State<Arc<UpstreamData>>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record_request(&data, &resource);

    let delay = *data.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if data.failing.lock().unwrap().contains(&resource) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let number = |key: &str, default: usize| {
        params
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    };
    let limit = number("limit", 10);
    let offset = number("offset", 0);

    let records = data
        .collections
        .lock()
        .unwrap()
        .get(&resource)
        .cloned()
        .unwrap_or_default();
    let results: Vec<Value> = records.iter().skip(offset).take(limit).cloned().collect();

    Json(json!({
        "count": records.len(),
        "next": null,
        "previous": null,
        "results": results,
    }))
    .into_response()
}

async fn feed_next(
    State(data): State<Arc<UpstreamData>>,
    Path(limit): Path<usize>,
) -> Response {
    record_request(&data, "feed");

    if data.failing.lock().unwrap().contains("feed") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "feed exploded").into_response();
    }

    let launches: Vec<Value> = data.feed.lock().unwrap().iter().take(limit).cloned().collect();
    Json(json!({ "result": launches })).into_response()
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub upstream: FakeUpstream,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let upstream = FakeUpstream::start().await;

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: config::DatabaseConfig { path: db_path },
            ll2: config::Ll2Config {
                url_prefix: upstream.ll2_prefix(),
                request_interval_seconds: 0.01,
                request_timeout_seconds: 5,
            },
            rocket_launch_api: config::RocketLaunchApiConfig {
                base_url: upstream.feed_base(),
                api_key: Some("test-key".to_string()),
                default_limit: 5,
                request_timeout_seconds: 5,
            },
            cache: config::CacheConfig {
                ttl_seconds: 300,
                max_items: 1000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let app = launchsync::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            upstream,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Trigger a sync inline and return the response
    pub async fn sync_and_wait(&self, resource: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/v1/sync/{resource}?wait=true")))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    /// Poll until no run of `resource` is active
    pub async fn wait_until_idle(&self, resource: SyncResource) {
        for _ in 0..200 {
            if !self.state.sync.is_running(resource) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("sync of {resource} did not finish");
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const LAUNCH_ID: &str = "eed1132a-d5aa-4c9c-bc38-c8ccb98829b6";

pub fn ll2_launch(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "net": "2025-10-26T14:05Z",
        "window_start": "2025-10-26T14:05:00Z",
        "window_end": null,
        "last_updated": "2025-10-20T08:00:00.123456+00:00",
        "status": {"id": 1, "abbrev": "Go"},
        "launch_service_provider": {"id": 121, "name": "SpaceX"}
    })
}

pub fn numbered(count: usize, kind: &str) -> Vec<Value> {
    (1..=count)
        .map(|id| json!({"id": id, "name": format!("{kind} {id}")}))
        .collect()
}

pub fn rocket_launch(id: i64, provider_id: i64, provider_name: &str) -> Value {
    json!({
        "id": id,
        "cospar_id": "",
        "sort_date": "1761487500",
        "name": format!("Flight {id}"),
        "provider": {"id": provider_id, "name": provider_name, "slug": "provider"},
        "vehicle": {"id": 7, "name": "SLS", "company_id": provider_id, "slug": "sls"},
        "pad": {
            "id": 3,
            "name": "LC-39B",
            "location": {
                "id": 61,
                "name": "Kennedy Space Center",
                "state": "FL",
                "statename": "Florida",
                "country": "United States",
                "slug": "ksc"
            }
        },
        "missions": [{"id": id * 10, "name": format!("Mission {id}"), "description": null}],
        "mission_description": "Crewed lunar flyby",
        "launch_description": null,
        "win_open": null,
        "t0": "2025-10-26T14:05Z",
        "win_close": null,
        "date_str": "Oct 26",
        "tags": [{"id": 1, "text": "Crewed"}],
        "slug": format!("flight-{id}"),
        "weather_summary": null,
        "weather_temp": 24.5,
        "weather_condition": null,
        "weather_wind_mph": null,
        "weather_icon": null,
        "weather_updated": null,
        "quicktext": "Flight",
        "suborbital": false,
        "modified": "2025-10-20T08:00:00Z"
    })
}
