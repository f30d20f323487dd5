//! Sync orchestration
//!
//! A run walks every page of one resource: wait for a rate-limiter token,
//! fetch a page, upsert each record, advance the offset by the number of
//! records actually returned. It stops once the offset reaches the count
//! the upstream reported or a page comes back empty. Any error aborts the
//! remaining pages and leaves already committed records in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

use super::fetcher::{PageFetcher, RocketLaunchFeed};
use super::models::{
    ExternalRecord, ExternalRocketLaunch, Ll2Agency, Ll2Launch, Ll2LauncherConfiguration,
    Ll2LauncherFamily, Ll2Location, Ll2Pad, Page,
};
use super::rate_limit::RateLimiter;
use super::reconcile::EntityReconciler;
use super::store::UpsertStore;
use crate::data::{CacheInvalidator, Database};
use crate::error::AppError;
use crate::metrics::{SYNC_ACTIVE_RUNS, SYNC_PAGES_FETCHED_TOTAL, SYNC_RECORDS_TOTAL};

// =============================================================================
// Resources
// =============================================================================

/// A logical upstream resource that can be synced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncResource {
    Launches,
    Agencies,
    Launchers,
    LauncherFamilies,
    Locations,
    Pads,
    RocketLaunches,
}

impl SyncResource {
    pub const ALL: [SyncResource; 7] = [
        SyncResource::Launches,
        SyncResource::Agencies,
        SyncResource::Launchers,
        SyncResource::LauncherFamilies,
        SyncResource::Locations,
        SyncResource::Pads,
        SyncResource::RocketLaunches,
    ];

    /// Name used in URLs and logs
    pub fn slug(&self) -> &'static str {
        match self {
            SyncResource::Launches => "launches",
            SyncResource::Agencies => "agencies",
            SyncResource::Launchers => "launchers",
            SyncResource::LauncherFamilies => "launcher-families",
            SyncResource::Locations => "locations",
            SyncResource::Pads => "pads",
            SyncResource::RocketLaunches => "rocket-launches",
        }
    }

    /// Path below the upstream prefix
    pub fn upstream_path(&self) -> &'static str {
        match self {
            SyncResource::Launches => "launches",
            SyncResource::Agencies => "agencies",
            SyncResource::Launchers => "launcher_configurations",
            SyncResource::LauncherFamilies => "launcher_configuration_families",
            SyncResource::Locations => "locations",
            SyncResource::Pads => "pads",
            SyncResource::RocketLaunches => "launches/next",
        }
    }

    /// Local collection, also the read-cache namespace
    pub fn collection(&self) -> &'static str {
        match self {
            SyncResource::Launches => "ll2_launch",
            SyncResource::Agencies => "ll2_agency",
            SyncResource::Launchers => "ll2_launcher",
            SyncResource::LauncherFamilies => "ll2_launcher_family",
            SyncResource::Locations => "ll2_location",
            SyncResource::Pads => "ll2_pad",
            SyncResource::RocketLaunches => "rocket_launches",
        }
    }

    /// Fixed page size, `None` for the feed whose size is configured
    pub fn page_size(&self) -> Option<u32> {
        match self {
            SyncResource::Launches | SyncResource::Agencies => Some(100),
            SyncResource::Launchers
            | SyncResource::LauncherFamilies
            | SyncResource::Locations
            | SyncResource::Pads => Some(10),
            SyncResource::RocketLaunches => None,
        }
    }

    /// Whether the resource is stored as documents
    pub fn is_document_collection(&self) -> bool {
        !matches!(self, SyncResource::RocketLaunches)
    }
}

impl fmt::Display for SyncResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for SyncResource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncResource::ALL
            .into_iter()
            .find(|resource| resource.slug() == s)
            .ok_or_else(|| AppError::Validation(format!("unknown sync resource: {s}")))
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Counters of one pagination pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageProgress {
    pub pages_fetched: u64,
    pub records_synced: u64,
    /// `count` of the last page fetched
    pub reported_count: u64,
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub resource: SyncResource,
    pub pages_fetched: u64,
    pub records_synced: u64,
    pub reported_count: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// =============================================================================
// Pagination driver
// =============================================================================

/// Drive `fetch` and `apply` over every page of a resource
///
/// `fetch` receives the current offset. Each page is preceded by a
/// rate-limiter token, each record is applied in order and the first
/// failure of either step ends the pass.
pub async fn drive_pages<T, F, FF, A, AF>(
    limiter: &RateLimiter,
    resource: SyncResource,
    mut fetch: F,
    mut apply: A,
) -> Result<PageProgress, AppError>
where
    F: FnMut(u64) -> FF,
    FF: Future<Output = Result<Page<T>, AppError>>,
    A: FnMut(T) -> AF,
    AF: Future<Output = Result<(), AppError>>,
{
    let mut progress = PageProgress::default();
    let mut offset: u64 = 0;

    loop {
        limiter.wait().await?;

        let page = fetch(offset).await?;
        progress.pages_fetched += 1;
        progress.reported_count = page.count;
        SYNC_PAGES_FETCHED_TOTAL
            .with_label_values(&[resource.slug()])
            .inc();

        // Guards against a count that shrank mid-run
        if page.is_empty() {
            break;
        }

        let returned = page.results.len() as u64;
        for record in page.results {
            apply(record).await?;
            progress.records_synced += 1;
            SYNC_RECORDS_TOTAL.with_label_values(&[resource.slug()]).inc();
        }

        offset += returned;
        tracing::info!(
            resource = %resource,
            fetched = offset,
            count = page.count,
            "Fetched {}/{}",
            offset,
            page.count
        );

        if offset >= page.count {
            break;
        }
    }

    Ok(progress)
}

// =============================================================================
// Runner
// =============================================================================

struct RunnerInner {
    fetcher: PageFetcher,
    feed: RocketLaunchFeed,
    store: UpsertStore,
    reconciler: EntityReconciler,
    limiter: Arc<RateLimiter>,
    invalidator: Arc<dyn CacheInvalidator>,
    active: Mutex<HashSet<SyncResource>>,
    feed_limit: u32,
}

/// Marks a resource as running until dropped
struct RunGuard {
    inner: Arc<RunnerInner>,
    resource: SyncResource,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.resource);
        SYNC_ACTIVE_RUNS
            .with_label_values(&[self.resource.slug()])
            .dec();
    }
}

/// Handle to a fire-and-forget run
pub struct SyncHandle {
    resource: SyncResource,
    task: JoinHandle<Result<SyncReport, AppError>>,
}

impl SyncHandle {
    pub fn resource(&self) -> SyncResource {
        self.resource
    }

    /// Await the terminal result of the run
    pub async fn wait(self) -> Result<SyncReport, AppError> {
        match self.task.await {
            Ok(result) => result,
            Err(error) => Err(AppError::Internal(anyhow::anyhow!(
                "sync task for {} did not complete: {error}",
                self.resource
            ))),
        }
    }
}

/// Orchestrates sync runs for every resource
///
/// At most one run per resource is active at a time. Runs of different
/// resources proceed concurrently and share one rate limiter.
#[derive(Clone)]
pub struct SyncRunner {
    inner: Arc<RunnerInner>,
}

impl SyncRunner {
    /// # Arguments
    /// * `feed_limit` - Launches requested from the rocket launch feed per run
    pub fn new(
        fetcher: PageFetcher,
        feed: RocketLaunchFeed,
        db: Arc<Database>,
        limiter: Arc<RateLimiter>,
        invalidator: Arc<dyn CacheInvalidator>,
        feed_limit: u32,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                fetcher,
                feed,
                store: UpsertStore::new(db.clone()),
                reconciler: EntityReconciler::new(db),
                limiter,
                invalidator,
                active: Mutex::new(HashSet::new()),
                feed_limit,
            }),
        }
    }

    pub fn is_running(&self, resource: SyncResource) -> bool {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&resource)
    }

    /// Run and wait for the terminal result
    ///
    /// The run itself lives on its own task, so dropping this future stops
    /// the wait but not the run.
    ///
    /// # Errors
    /// `Conflict` if a run of `resource` is already active, otherwise the
    /// first fatal fetch, decode or store error.
    pub async fn run(&self, resource: SyncResource) -> Result<SyncReport, AppError> {
        self.spawn(resource)?.wait().await
    }

    /// Start a run in the background and return immediately
    ///
    /// Failures are logged by the task itself; the handle can still be
    /// awaited for the result.
    pub fn spawn(&self, resource: SyncResource) -> Result<SyncHandle, AppError> {
        let guard = self.acquire(resource)?;
        let runner = self.clone();
        let task = tokio::spawn(async move { runner.execute(resource, guard).await });

        Ok(SyncHandle { resource, task })
    }

    fn acquire(&self, resource: SyncResource) -> Result<RunGuard, AppError> {
        let mut active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !active.insert(resource) {
            return Err(AppError::Conflict(format!(
                "sync of {resource} is already running"
            )));
        }
        SYNC_ACTIVE_RUNS.with_label_values(&[resource.slug()]).inc();

        Ok(RunGuard {
            inner: self.inner.clone(),
            resource,
        })
    }

    async fn execute(
        &self,
        resource: SyncResource,
        _guard: RunGuard,
    ) -> Result<SyncReport, AppError> {
        let started_at = Utc::now();
        let started = Instant::now();
        tracing::info!(resource = %resource, "Sync started");

        let result = match resource {
            SyncResource::Launches => self.sync_collection::<Ll2Launch>(resource).await,
            SyncResource::Agencies => self.sync_collection::<Ll2Agency>(resource).await,
            SyncResource::Launchers => {
                self.sync_collection::<Ll2LauncherConfiguration>(resource)
                    .await
            }
            SyncResource::LauncherFamilies => {
                self.sync_collection::<Ll2LauncherFamily>(resource).await
            }
            SyncResource::Locations => self.sync_collection::<Ll2Location>(resource).await,
            SyncResource::Pads => self.sync_collection::<Ll2Pad>(resource).await,
            SyncResource::RocketLaunches => self.sync_rocket_launches().await,
        };

        // Partial progress may already be committed
        self.inner
            .invalidator
            .invalidate_namespace(resource.collection());

        match result {
            Ok(progress) => {
                crate::metrics::observe_sync_run(resource.slug(), "success", started.elapsed());
                tracing::info!(
                    resource = %resource,
                    pages = progress.pages_fetched,
                    records = progress.records_synced,
                    count = progress.reported_count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Sync finished"
                );

                Ok(SyncReport {
                    resource,
                    pages_fetched: progress.pages_fetched,
                    records_synced: progress.records_synced,
                    reported_count: progress.reported_count,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(error) => {
                crate::metrics::observe_sync_run(resource.slug(), "error", started.elapsed());
                tracing::error!(resource = %resource, %error, "Sync failed");
                Err(error)
            }
        }
    }

    async fn sync_collection<R: ExternalRecord>(
        &self,
        resource: SyncResource,
    ) -> Result<PageProgress, AppError> {
        let path = resource.upstream_path();
        let collection = resource.collection();
        let page_size = resource.page_size().unwrap_or(self.inner.feed_limit);
        let fetcher = &self.inner.fetcher;
        let store = &self.inner.store;

        drive_pages(
            &self.inner.limiter,
            resource,
            move |offset| fetcher.fetch_page::<R>(path, page_size, offset),
            move |record: R| async move { store.upsert(collection, &record).await },
        )
        .await
    }

    async fn sync_rocket_launches(&self) -> Result<PageProgress, AppError> {
        let feed = &self.inner.feed;
        let reconciler = &self.inner.reconciler;
        let limit = self.inner.feed_limit;

        drive_pages(
            &self.inner.limiter,
            SyncResource::RocketLaunches,
            move |_offset| feed.fetch_next(limit),
            move |launch: ExternalRocketLaunch| async move {
                reconciler.reconcile(&launch).await.map(|_| ())
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockCacheInvalidator;
    use mockall::predicate::eq;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn fast_limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_millis(1))
    }

    fn numbered_page(total: u64, page_size: u64, offset: u64) -> Page<u64> {
        let end = (offset + page_size).min(total);
        Page {
            count: total,
            next: None,
            previous: None,
            results: (offset..end).collect(),
        }
    }

    #[test]
    fn test_resource_table() {
        assert_eq!(
            "launcher-families".parse::<SyncResource>().unwrap(),
            SyncResource::LauncherFamilies
        );
        assert_eq!(
            SyncResource::Launchers.upstream_path(),
            "launcher_configurations"
        );
        assert_eq!(SyncResource::Launches.page_size(), Some(100));
        assert_eq!(SyncResource::Pads.page_size(), Some(10));
        assert_eq!(SyncResource::RocketLaunches.collection(), "rocket_launches");
        assert!(matches!(
            "rockets".parse::<SyncResource>(),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_count_is_ceil_of_total_over_page_size() {
        let limiter = fast_limiter();
        let fetches = AtomicU64::new(0);
        let applied = AtomicU64::new(0);
        let (fetches_ref, applied_ref) = (&fetches, &applied);

        let progress = drive_pages(
            &limiter,
            SyncResource::Pads,
            move |offset| async move {
                fetches_ref.fetch_add(1, Ordering::SeqCst);
                Ok(numbered_page(25, 10, offset))
            },
            move |_record: u64| async move {
                applied_ref.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await
        .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 3);
        assert_eq!(applied.load(Ordering::SeqCst), 25);
        assert_eq!(progress.pages_fetched, 3);
        assert_eq!(progress.records_synced, 25);
        assert_eq!(progress.reported_count, 25);
    }

    #[tokio::test]
    async fn test_exact_multiple_stops_without_extra_fetch() {
        let limiter = fast_limiter();

        let progress = drive_pages(
            &limiter,
            SyncResource::Pads,
            |offset| async move { Ok(numbered_page(20, 10, offset)) },
            |_record: u64| async { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(progress.pages_fetched, 2);
        assert_eq!(progress.records_synced, 20);
    }

    #[tokio::test]
    async fn test_zero_count_fetches_once() {
        let limiter = fast_limiter();

        let progress = drive_pages(
            &limiter,
            SyncResource::Agencies,
            |offset| async move { Ok(numbered_page(0, 100, offset)) },
            |_record: u64| async { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(progress.pages_fetched, 1);
        assert_eq!(progress.records_synced, 0);
    }

    #[tokio::test]
    async fn test_empty_page_ends_run_despite_count() {
        let limiter = fast_limiter();

        // Upstream claims 30 records but only has 12
        let progress = drive_pages(
            &limiter,
            SyncResource::Locations,
            |offset| async move {
                let mut page = numbered_page(12, 10, offset);
                page.count = 30;
                Ok(page)
            },
            |_record: u64| async { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(progress.pages_fetched, 3);
        assert_eq!(progress.records_synced, 12);
    }

    #[tokio::test]
    async fn test_offset_advances_by_records_returned() {
        let limiter = fast_limiter();
        let offsets = Mutex::new(Vec::new());
        let offsets_ref = &offsets;

        // Upstream returns fewer records than asked for
        drive_pages(
            &limiter,
            SyncResource::Launchers,
            move |offset| async move {
                offsets_ref.lock().unwrap().push(offset);
                Ok(numbered_page(9, 4, offset))
            },
            |_record: u64| async { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(*offsets.lock().unwrap(), vec![0, 4, 8]);
    }

    #[tokio::test]
    async fn test_apply_failure_aborts_remaining_pages() {
        let limiter = fast_limiter();
        let fetches = AtomicU64::new(0);
        let fetches_ref = &fetches;

        let result = drive_pages(
            &limiter,
            SyncResource::Pads,
            move |offset| async move {
                fetches_ref.fetch_add(1, Ordering::SeqCst);
                Ok(numbered_page(30, 10, offset))
            },
            |record: u64| async move {
                if record == 13 {
                    Err(AppError::Internal(anyhow::anyhow!("store unavailable")))
                } else {
                    Ok(())
                }
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let limiter = fast_limiter();

        let result = drive_pages(
            &limiter,
            SyncResource::Pads,
            |offset| async move {
                if offset >= 10 {
                    Err(AppError::Upstream("GET /pads returned HTTP 503".to_string()))
                } else {
                    Ok(numbered_page(30, 10, offset))
                }
            },
            |_record: u64| async { Ok(()) },
        )
        .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_closed_limiter_stops_before_fetching() {
        let limiter = fast_limiter();
        limiter.close();
        let fetches = AtomicU64::new(0);
        let fetches_ref = &fetches;

        let result = drive_pages(
            &limiter,
            SyncResource::Pads,
            move |offset| async move {
                fetches_ref.fetch_add(1, Ordering::SeqCst);
                Ok(numbered_page(10, 10, offset))
            },
            |_record: u64| async { Ok(()) },
        )
        .await;

        assert!(matches!(result, Err(AppError::RateLimiterClosed)));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    // -------------------------------------------------------------------------
    // Runner against a local upstream
    // -------------------------------------------------------------------------

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Upstream with 3 pads, answering slowly enough to observe a running sync
    fn pads_upstream(delay: Duration) -> Router {
        Router::new()
            .route(
                "/pads",
                get(move |Query(params): Query<HashMap<String, String>>| async move {
                    tokio::time::sleep(delay).await;
                    let offset: u64 = params
                        .get("offset")
                        .and_then(|value| value.parse().ok())
                        .unwrap_or(0);
                    let results: Vec<_> = (offset..3.min(offset + 10))
                        .map(|id| serde_json::json!({"id": id + 1, "name": format!("Pad {}", id + 1)}))
                        .collect();
                    Json(serde_json::json!({"count": 3, "next": null, "previous": null, "results": results}))
                }),
            )
            .route(
                "/agencies",
                get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
    }

    async fn create_runner(
        base: &str,
        invalidator: MockCacheInvalidator,
    ) -> (SyncRunner, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("runner.db"))
                .await
                .unwrap(),
        );
        let client = reqwest::Client::new();
        let runner = SyncRunner::new(
            PageFetcher::new(client.clone(), base, Duration::from_secs(5)),
            RocketLaunchFeed::new(client, format!("{base}/json"), None, Duration::from_secs(5)),
            db.clone(),
            Arc::new(fast_limiter()),
            Arc::new(invalidator),
            10,
        );
        (runner, db, temp_dir)
    }

    #[tokio::test]
    async fn test_run_syncs_and_invalidates_namespace() {
        let base = serve(pads_upstream(Duration::ZERO)).await;
        let mut invalidator = MockCacheInvalidator::new();
        invalidator
            .expect_invalidate_namespace()
            .with(eq("ll2_pad"))
            .times(1)
            .return_const(());
        let (runner, db, _temp_dir) = create_runner(&base, invalidator).await;

        let report = runner.run(SyncResource::Pads).await.unwrap();

        assert_eq!(report.resource, SyncResource::Pads);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.records_synced, 3);
        assert_eq!(report.reported_count, 3);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(db.count_documents("ll2_pad").await.unwrap(), 3);
        assert!(!runner.is_running(SyncResource::Pads));
    }

    #[tokio::test]
    async fn test_failed_run_still_invalidates_namespace() {
        let base = serve(pads_upstream(Duration::ZERO)).await;
        let mut invalidator = MockCacheInvalidator::new();
        invalidator
            .expect_invalidate_namespace()
            .with(eq("ll2_agency"))
            .times(1)
            .return_const(());
        let (runner, _db, _temp_dir) = create_runner(&base, invalidator).await;

        let error = runner.run(SyncResource::Agencies).await.unwrap_err();

        assert!(matches!(error, AppError::Upstream(message) if message.contains("500")));
        assert!(!runner.is_running(SyncResource::Agencies));
    }

    #[tokio::test]
    async fn test_overlapping_run_is_rejected() {
        let base = serve(pads_upstream(Duration::from_millis(300))).await;
        let mut invalidator = MockCacheInvalidator::new();
        invalidator
            .expect_invalidate_namespace()
            .times(2)
            .return_const(());
        let (runner, _db, _temp_dir) = create_runner(&base, invalidator).await;

        let handle = runner.spawn(SyncResource::Pads).unwrap();
        assert!(runner.is_running(SyncResource::Pads));

        let second = runner.spawn(SyncResource::Pads);
        assert!(matches!(second, Err(AppError::Conflict(_))));
        let inline = runner.run(SyncResource::Pads).await;
        assert!(matches!(inline, Err(AppError::Conflict(_))));

        let report = handle.wait().await.unwrap();
        assert_eq!(report.records_synced, 3);
        assert!(!runner.is_running(SyncResource::Pads));

        // Guard released, a new run is accepted
        runner.run(SyncResource::Pads).await.unwrap();
    }

    #[tokio::test]
    async fn test_spawned_failure_is_observable_through_handle() {
        let base = serve(pads_upstream(Duration::ZERO)).await;
        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_invalidate_namespace().return_const(());
        let (runner, _db, _temp_dir) = create_runner(&base, invalidator).await;

        let handle = runner.spawn(SyncResource::Agencies).unwrap();
        assert_eq!(handle.resource(), SyncResource::Agencies);

        let result = handle.wait().await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_dropped_run_completes_in_background() {
        let base = serve(pads_upstream(Duration::from_millis(200))).await;
        let invalidated = Arc::new(Mutex::new(Vec::<String>::new()));
        let recorded = invalidated.clone();
        let mut invalidator = MockCacheInvalidator::new();
        invalidator
            .expect_invalidate_namespace()
            .returning(move |namespace| recorded.lock().unwrap().push(namespace.to_string()));
        let (runner, db, _temp_dir) = create_runner(&base, invalidator).await;

        let waited =
            tokio::time::timeout(Duration::from_millis(50), runner.run(SyncResource::Pads)).await;
        assert!(waited.is_err());
        assert!(runner.is_running(SyncResource::Pads));

        for _ in 0..100 {
            if !runner.is_running(SyncResource::Pads) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(!runner.is_running(SyncResource::Pads));
        assert_eq!(db.count_documents("ll2_pad").await.unwrap(), 3);
        assert_eq!(*invalidated.lock().unwrap(), vec!["ll2_pad".to_string()]);
    }
}
