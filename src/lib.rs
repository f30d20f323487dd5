//! LaunchSync - keeps a local store in step with public space-launch APIs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Sync triggers (inline or fire-and-forget)                │
//! │  - Reads of synced collections and rocket launches          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Sync Engine            Service Layer            │
//! │  - Rate-limited pagination     - Cached read paths          │
//! │  - Keyed upserts                                            │
//! │  - Foreign entity reconciliation                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Moka read cache                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `sync`: Rate limiter, fetchers, upsert store, runner, reconciler
//! - `service`: Read-side logic
//! - `data`: Database and cache layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod sync;

use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Read cache, invalidated per collection by sync runs
    pub cache: Arc<data::ReadCache>,

    /// Process-wide spacing of upstream requests
    pub limiter: Arc<sync::RateLimiter>,

    /// Sync orchestration
    pub sync: sync::SyncRunner,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and apply migrations
    /// 2. Initialize read cache
    /// 3. Build HTTP client and rate limiter
    /// 4. Wire the sync runner
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");
        config.validate()?;

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Initialize cache
        let cache = Arc::new(data::ReadCache::new(
            config.cache.max_items,
            std::time::Duration::from_secs(config.cache.ttl_seconds),
        ));
        tracing::info!("Cache initialized");

        // 3. Initialize HTTP client and rate limiter
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("launchsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;
        let limiter = Arc::new(sync::RateLimiter::new(config.ll2.request_interval()));

        // 4. Wire the sync runner
        let fetcher = sync::PageFetcher::new(
            http_client.clone(),
            config.ll2.url_prefix.clone(),
            config.ll2.request_timeout(),
        );
        let feed = sync::RocketLaunchFeed::new(
            http_client,
            config.rocket_launch_api.base_url.clone(),
            config.rocket_launch_api.api_key.clone(),
            config.rocket_launch_api.request_timeout(),
        );
        let invalidator: Arc<dyn data::CacheInvalidator> = cache.clone();
        let sync = sync::SyncRunner::new(
            fetcher,
            feed,
            db.clone(),
            limiter.clone(),
            invalidator,
            config.rocket_launch_api.default_limit,
        );

        tracing::info!(
            interval_ms = limiter.interval().as_millis() as u64,
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            cache,
            limiter,
            sync,
        })
    }

    /// Release background resources
    ///
    /// Closes the rate limiter so pending and future waits fail fast.
    pub fn shutdown(&self) {
        self.limiter.close();
        tracing::info!("Rate limiter closed");
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer,
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    };

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
