//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::time::Duration;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "launchsync_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Sync Metrics
    pub static ref SYNC_RUNS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_sync_runs_total", "Total number of finished sync runs"),
        &["resource", "status"]
    ).expect("metric can be created");
    pub static ref SYNC_PAGES_FETCHED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_sync_pages_fetched_total", "Total number of upstream pages fetched"),
        &["resource"]
    ).expect("metric can be created");
    pub static ref SYNC_RECORDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_sync_records_total", "Total number of records upserted by sync runs"),
        &["resource"]
    ).expect("metric can be created");
    pub static ref SYNC_RUN_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "launchsync_sync_run_duration_seconds",
            "Sync run duration in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
        &["resource"]
    ).expect("metric can be created");
    pub static ref SYNC_ACTIVE_RUNS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("launchsync_sync_active_runs", "Sync runs currently in progress"),
        &["resource"]
    ).expect("metric can be created");
    pub static ref RECONCILE_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_reconcile_failures_total", "Non-fatal foreign entity reconciliation failures"),
        &["entity"]
    ).expect("metric can be created");

    // Upstream Metrics
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_upstream_requests_total", "Total number of upstream HTTP requests"),
        &["endpoint", "status"]
    ).expect("metric can be created");
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "launchsync_upstream_request_duration_seconds",
            "Upstream request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_SIZE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("launchsync_cache_size", "Current number of items in cache"),
        &["cache_name"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("launchsync_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Record one upstream request outcome.
pub fn observe_upstream_request(endpoint: &str, status: &str, elapsed: Duration) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();
    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(elapsed.as_secs_f64());
}

/// Record a finished sync run.
pub fn observe_sync_run(resource: &str, status: &str, elapsed: Duration) {
    SYNC_RUNS_TOTAL.with_label_values(&[resource, status]).inc();
    SYNC_RUN_DURATION_SECONDS
        .with_label_values(&[resource])
        .observe(elapsed.as_secs_f64());
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(SYNC_RUNS_TOTAL.clone()))
        .expect("SYNC_RUNS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SYNC_PAGES_FETCHED_TOTAL.clone()))
        .expect("SYNC_PAGES_FETCHED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SYNC_RECORDS_TOTAL.clone()))
        .expect("SYNC_RECORDS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SYNC_RUN_DURATION_SECONDS.clone()))
        .expect("SYNC_RUN_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(SYNC_ACTIVE_RUNS.clone()))
        .expect("SYNC_ACTIVE_RUNS can be registered");
    REGISTRY
        .register(Box::new(RECONCILE_FAILURES_TOTAL.clone()))
        .expect("RECONCILE_FAILURES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(UPSTREAM_REQUESTS_TOTAL.clone()))
        .expect("UPSTREAM_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()))
        .expect("UPSTREAM_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(CACHE_HITS_TOTAL.clone()))
        .expect("CACHE_HITS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_MISSES_TOTAL.clone()))
        .expect("CACHE_MISSES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_SIZE.clone()))
        .expect("CACHE_SIZE can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
