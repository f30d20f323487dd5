//! Upstream synchronization engine

mod fetcher;
mod models;
mod rate_limit;
mod reconcile;
mod runner;
mod store;
mod timestamp;

pub use fetcher::{PageFetcher, RocketLaunchFeed};
pub use models::*;
pub use rate_limit::RateLimiter;
pub use reconcile::{EntityReconciler, ReconcileOutcome, convert_launch};
pub use runner::{PageProgress, SyncHandle, SyncReport, SyncResource, SyncRunner, drive_pages};
pub use store::UpsertStore;
pub use timestamp::{FlexibleTimestamp, TimestampError, decode as decode_timestamp, encode as encode_timestamp};
