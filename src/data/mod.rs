//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations
//! - Read cache (volatile)

mod cache;
mod database;
mod models;

pub use cache::{CacheInvalidator, ReadCache};
pub use database::Database;
pub use models::*;

#[cfg(test)]
pub use cache::MockCacheInvalidator;
