//! Rocket launch reconciliation
//!
//! Merges one feed launch into the relational tables: the provider company
//! and launch site are found or created by their own external ids, the
//! launch is upserted by external id and its missions are replaced.
//! Only the launch upsert is fatal; everything around it is logged and
//! counted.

use chrono::Utc;
use std::sync::Arc;

use super::models::{ExternalPadLocation, ExternalProvider, ExternalRocketLaunch};
use crate::data::{Database, NewMission, NewRocketLaunch};
use crate::error::AppError;
use crate::metrics::RECONCILE_FAILURES_TOTAL;

/// Status given to every launch arriving from the feed
const DEFAULT_STATUS: &str = "scheduled";

/// What happened to one launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub launch_id: i64,
    pub provider_id: Option<i64>,
    pub launch_base_id: Option<i64>,
    pub missions_synced: bool,
}

#[derive(Clone)]
pub struct EntityReconciler {
    db: Arc<Database>,
}

impl EntityReconciler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Reconcile one launch and its foreign entities
    ///
    /// # Errors
    /// Only a failed launch upsert is returned. Company, location and
    /// mission failures are logged and leave the launch in place.
    pub async fn reconcile(
        &self,
        external: &ExternalRocketLaunch,
    ) -> Result<ReconcileOutcome, AppError> {
        let provider_id = match external.reconcilable_provider() {
            Some(provider) => match self.reconcile_company(provider).await {
                Ok(id) => Some(id),
                Err(error) => {
                    RECONCILE_FAILURES_TOTAL.with_label_values(&["company"]).inc();
                    tracing::warn!(
                        launch = external.id,
                        company = provider.id,
                        %error,
                        "Failed to sync company"
                    );
                    None
                }
            },
            None => None,
        };

        let launch_base_id = match external.reconcilable_location() {
            Some(location) => match self.reconcile_location(location).await {
                Ok(id) => Some(id),
                Err(error) => {
                    RECONCILE_FAILURES_TOTAL.with_label_values(&["location"]).inc();
                    tracing::warn!(
                        launch = external.id,
                        location = location.id,
                        %error,
                        "Failed to sync location"
                    );
                    None
                }
            },
            None => None,
        };

        let mut launch = convert_launch(external);
        launch.provider_id = provider_id;
        launch.launch_base_id = launch_base_id;

        let launch_id = self.db.upsert_rocket_launch(&launch).await?;

        let missions = convert_missions(external);
        let missions_synced = match self.db.replace_missions(launch_id, &missions).await {
            Ok(()) => true,
            Err(error) => {
                RECONCILE_FAILURES_TOTAL.with_label_values(&["missions"]).inc();
                tracing::warn!(launch = external.id, launch_id, %error, "Failed to sync missions");
                false
            }
        };

        Ok(ReconcileOutcome {
            launch_id,
            provider_id,
            launch_base_id,
            missions_synced,
        })
    }

    /// Find-or-create the provider, refreshing its name
    async fn reconcile_company(&self, provider: &ExternalProvider) -> Result<i64, AppError> {
        if let Some(company) = self.db.get_company_by_external_id(provider.id).await? {
            self.db.update_company_name(company.id, &provider.name).await?;
            return Ok(company.id);
        }

        let id = self.db.insert_company(provider.id, &provider.name, "").await?;
        tracing::info!(company = provider.id, name = %provider.name, "Company created");
        Ok(id)
    }

    /// Find-or-create the launch site, refreshing name, region and country
    async fn reconcile_location(&self, location: &ExternalPadLocation) -> Result<i64, AppError> {
        let region = location.region_label();
        let country = location.country.as_deref().unwrap_or_default();

        if let Some(base) = self.db.get_launch_base_by_external_id(location.id).await? {
            self.db
                .update_launch_base(base.id, &location.name, &region, country)
                .await?;
            return Ok(base.id);
        }

        let id = self
            .db
            .insert_launch_base(location.id, &location.name, &region, country)
            .await?;
        tracing::info!(location = location.id, name = %location.name, "Launch base created");
        Ok(id)
    }
}

/// Map a feed launch onto the local launch shape
///
/// Without a T0 the launch date becomes the current time and is flagged as a
/// placeholder.
pub fn convert_launch(external: &ExternalRocketLaunch) -> NewRocketLaunch {
    let (launch_date, launch_date_is_placeholder) = match external.t0.value() {
        Some(t0) => (t0, false),
        None => (Utc::now(), true),
    };

    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    NewRocketLaunch {
        external_id: external.id,
        cospar_id: text(&external.cospar_id),
        sort_date: text(&external.sort_date),
        name: external.name.clone(),
        launch_date,
        launch_date_is_placeholder,
        provider_id: None,
        launch_base_id: None,
        mission_description: text(&external.mission_description),
        launch_description: text(&external.launch_description),
        window_open: external.win_open.value(),
        t0: external.t0.value(),
        window_close: external.win_close.value(),
        date_str: text(&external.date_str),
        slug: text(&external.slug),
        weather_summary: text(&external.weather_summary),
        weather_temp: external.weather_temp,
        weather_condition: text(&external.weather_condition),
        weather_wind_mph: external.weather_wind_mph,
        weather_icon: text(&external.weather_icon),
        weather_updated: external.weather_updated.value(),
        quicktext: text(&external.quicktext),
        suborbital: external.suborbital,
        modified: external.modified.value(),
        status: DEFAULT_STATUS.to_string(),
    }
}

fn convert_missions(external: &ExternalRocketLaunch) -> Vec<NewMission> {
    external
        .missions
        .iter()
        .map(|mission| NewMission {
            external_id: mission.id,
            name: mission.name.clone(),
            description: mission.description.clone().unwrap_or_default(),
        })
        .collect()
}
