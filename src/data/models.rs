//! Data models
//!
//! Rust structs representing database rows.
//! Local ids are SQLite integer keys, upstream ids live in `external_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Documents
// =============================================================================

/// A synced upstream record stored under `(collection, external_id)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub collection: String,
    pub external_id: String,
    /// Upstream record as JSON
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row, body still serialized
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub collection: String,
    pub external_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for StoredDocument {
    type Error = serde_json::Error;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            body: serde_json::from_str(&row.body)?,
            collection: row.collection,
            external_id: row.external_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Company / Launch base
// =============================================================================

/// Launch service provider
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub external_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Launch site
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LaunchBase {
    pub id: i64,
    pub external_id: Option<i64>,
    pub name: String,
    /// "{state}, {statename}"
    pub location: String,
    pub country: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Rocket launch
// =============================================================================

/// A locally persisted rocket launch
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RocketLaunch {
    pub id: i64,
    pub external_id: i64,
    pub cospar_id: String,
    pub sort_date: String,
    pub name: String,
    pub launch_date: DateTime<Utc>,
    /// Set when upstream had no T0 and `launch_date` is the sync time
    pub launch_date_is_placeholder: bool,
    pub provider_id: Option<i64>,
    pub launch_base_id: Option<i64>,
    pub mission_description: String,
    pub launch_description: String,
    #[serde(rename = "win_open")]
    pub window_open: Option<DateTime<Utc>>,
    pub t0: Option<DateTime<Utc>>,
    #[serde(rename = "win_close")]
    pub window_close: Option<DateTime<Utc>>,
    pub date_str: String,
    pub slug: String,
    pub weather_summary: String,
    pub weather_temp: Option<f32>,
    pub weather_condition: String,
    pub weather_wind_mph: Option<f32>,
    pub weather_icon: String,
    pub weather_updated: Option<DateTime<Utc>>,
    pub quicktext: String,
    pub suborbital: bool,
    pub modified: Option<DateTime<Utc>>,
    /// scheduled, successful, failed, cancelled
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missions: Vec<RocketLaunchMission>,
}

/// Launch fields written by a sync, keyed by `external_id`
#[derive(Debug, Clone, PartialEq)]
pub struct NewRocketLaunch {
    pub external_id: i64,
    pub cospar_id: String,
    pub sort_date: String,
    pub name: String,
    pub launch_date: DateTime<Utc>,
    pub launch_date_is_placeholder: bool,
    pub provider_id: Option<i64>,
    pub launch_base_id: Option<i64>,
    pub mission_description: String,
    pub launch_description: String,
    pub window_open: Option<DateTime<Utc>>,
    pub t0: Option<DateTime<Utc>>,
    pub window_close: Option<DateTime<Utc>>,
    pub date_str: String,
    pub slug: String,
    pub weather_summary: String,
    pub weather_temp: Option<f32>,
    pub weather_condition: String,
    pub weather_wind_mph: Option<f32>,
    pub weather_icon: String,
    pub weather_updated: Option<DateTime<Utc>>,
    pub quicktext: String,
    pub suborbital: bool,
    pub modified: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RocketLaunchMission {
    pub id: i64,
    pub rocket_launch_id: i64,
    pub external_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMission {
    pub external_id: Option<i64>,
    pub name: String,
    pub description: String,
}
