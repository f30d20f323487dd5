//! Service layer
//!
//! Read-side business logic separated from HTTP handlers. Services page
//! through synced data via the read cache.

mod catalog;
mod rocket_launch;

pub use catalog::{CatalogPage, CatalogService};
pub use rocket_launch::{RocketLaunchPage, RocketLaunchService};
