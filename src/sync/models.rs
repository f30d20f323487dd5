//! Upstream record types
//!
//! Launch Library 2 records are typed on the fields the sync engine relies
//! on and carry every other upstream field through untouched, so a stored
//! document is the upstream record with its timestamps normalized.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::timestamp::FlexibleTimestamp;

// =============================================================================
// Paging
// =============================================================================

/// One paginated chunk of an upstream resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total item count of the resource at fetch time
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap an unpaginated result list as a single complete page
    pub fn single(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// =============================================================================
// External IDs
// =============================================================================

/// Identifier assigned by the upstream source
///
/// Launch Library 2 uses UUID strings for launches and integers for
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Number(id) => write!(f, "{id}"),
            ExternalId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ExternalId {
    fn from(id: i64) -> Self {
        ExternalId::Number(id)
    }
}

impl From<&str> for ExternalId {
    fn from(id: &str) -> Self {
        ExternalId::Text(id.to_string())
    }
}

impl From<String> for ExternalId {
    fn from(id: String) -> Self {
        ExternalId::Text(id)
    }
}

/// Any decoded page item that can be stored under its upstream id
pub trait ExternalRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn external_id(&self) -> ExternalId;
}

// =============================================================================
// Launch Library 2
// =============================================================================

/// Launch (`/launches`), keyed by UUID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ll2Launch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub net: FlexibleTimestamp,
    #[serde(default)]
    pub window_start: FlexibleTimestamp,
    #[serde(default)]
    pub window_end: FlexibleTimestamp,
    #[serde(default)]
    pub last_updated: FlexibleTimestamp,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExternalRecord for Ll2Launch {
    fn external_id(&self) -> ExternalId {
        ExternalId::Text(self.id.clone())
    }
}

/// Agency (`/agencies`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ll2Agency {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub abbrev: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExternalRecord for Ll2Agency {
    fn external_id(&self) -> ExternalId {
        ExternalId::Number(self.id)
    }
}

/// Launcher configuration (`/launcher_configurations`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ll2LauncherConfiguration {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExternalRecord for Ll2LauncherConfiguration {
    fn external_id(&self) -> ExternalId {
        ExternalId::Number(self.id)
    }
}

/// Launcher family (`/launcher_configuration_families`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ll2LauncherFamily {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExternalRecord for Ll2LauncherFamily {
    fn external_id(&self) -> ExternalId {
        ExternalId::Number(self.id)
    }
}

/// Location (`/locations`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ll2Location {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExternalRecord for Ll2Location {
    fn external_id(&self) -> ExternalId {
        ExternalId::Number(self.id)
    }
}

/// Pad (`/pads`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ll2Pad {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExternalRecord for Ll2Pad {
    fn external_id(&self) -> ExternalId {
        ExternalId::Number(self.id)
    }
}

// =============================================================================
// RocketLaunch.Live
// =============================================================================

/// Reads an explicit `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /launches/next/{n}` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RocketLaunchFeedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<ExternalRocketLaunch>,
}

/// Launch service provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalProvider {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalVehicle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalPad {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub location: Option<ExternalPadLocation>,
}

/// Launch site referenced by a pad
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalPadLocation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub statename: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl ExternalPadLocation {
    /// Human readable "{state}, {statename}" label
    pub fn region_label(&self) -> String {
        format!(
            "{}, {}",
            self.state.as_deref().unwrap_or_default(),
            self.statename.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalMission {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalTag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

/// Launch record from the RocketLaunch.Live feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRocketLaunch {
    pub id: i64,
    #[serde(default)]
    pub cospar_id: Option<String>,
    #[serde(default)]
    pub sort_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub provider: Option<ExternalProvider>,
    #[serde(default)]
    pub vehicle: Option<ExternalVehicle>,
    #[serde(default)]
    pub pad: Option<ExternalPad>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missions: Vec<ExternalMission>,
    #[serde(default)]
    pub mission_description: Option<String>,
    #[serde(default)]
    pub launch_description: Option<String>,
    #[serde(default)]
    pub win_open: FlexibleTimestamp,
    #[serde(default)]
    pub t0: FlexibleTimestamp,
    #[serde(default)]
    pub win_close: FlexibleTimestamp,
    #[serde(default)]
    pub date_str: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<ExternalTag>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub weather_summary: Option<String>,
    #[serde(default)]
    pub weather_temp: Option<f32>,
    #[serde(default)]
    pub weather_condition: Option<String>,
    #[serde(default)]
    pub weather_wind_mph: Option<f32>,
    #[serde(default)]
    pub weather_icon: Option<String>,
    #[serde(default)]
    pub weather_updated: FlexibleTimestamp,
    #[serde(default)]
    pub quicktext: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suborbital: bool,
    #[serde(default)]
    pub modified: FlexibleTimestamp,
}

impl ExternalRocketLaunch {
    /// Provider with a usable external id
    pub fn reconcilable_provider(&self) -> Option<&ExternalProvider> {
        self.provider.as_ref().filter(|provider| provider.id > 0)
    }

    /// Pad location with a usable external id
    pub fn reconcilable_location(&self) -> Option<&ExternalPadLocation> {
        self.pad
            .as_ref()
            .and_then(|pad| pad.location.as_ref())
            .filter(|location| location.id > 0)
    }
}

impl ExternalRecord for ExternalRocketLaunch {
    fn external_id(&self) -> ExternalId {
        ExternalId::Number(self.id)
    }
}
