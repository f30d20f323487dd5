//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with migrations applied on connect.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

fn decode_documents(rows: Vec<DocumentRow>) -> Result<Vec<StoredDocument>, AppError> {
    rows.into_iter()
        .map(|row| {
            StoredDocument::try_from(row).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("stored document is not valid JSON: {e}"))
            })
        })
        .collect()
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        if path.to_str().is_none() {
            return Err(AppError::Config(format!(
                "database path must be valid UTF-8: {}",
                path.display()
            )));
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Insert or replace the document stored under `(collection, external_id)`
    ///
    /// Single statement, so concurrent writers to the same key never produce
    /// two rows. `created_at` survives updates.
    pub async fn upsert_document(
        &self,
        collection: &str,
        external_id: &str,
        body: &serde_json::Value,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let body = body.to_string();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, external_id, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(collection, external_id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(external_id)
        .bind(&body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one document by key
    pub async fn get_document(
        &self,
        collection: &str,
        external_id: &str,
    ) -> Result<Option<StoredDocument>, AppError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE collection = ? AND external_id = ?",
        )
        .bind(collection)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(decode_documents(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    /// Page through a collection in ascending upstream id order
    ///
    /// Numeric ids compare as numbers, shorter first, UUIDs lexically.
    pub async fn list_documents(
        &self,
        collection: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredDocument>, AppError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT * FROM documents
            WHERE collection = ?
            ORDER BY length(external_id) ASC, external_id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(collection)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        decode_documents(rows)
    }

    pub async fn count_documents(&self, collection: &str) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    // =========================================================================
    // Company
    // =========================================================================

    pub async fn get_company_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(company)
    }

    /// Insert a company, returning its local id
    pub async fn insert_company(
        &self,
        external_id: i64,
        name: &str,
        description: &str,
    ) -> Result<i64, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO companies (external_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(external_id)
        .bind(name)
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_company_name(&self, id: i64, name: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE companies SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(companies)
    }

    // =========================================================================
    // Launch base
    // =========================================================================

    pub async fn get_launch_base_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<LaunchBase>, AppError> {
        let base =
            sqlx::query_as::<_, LaunchBase>("SELECT * FROM launch_bases WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(base)
    }

    /// Insert a launch base, returning its local id
    pub async fn insert_launch_base(
        &self,
        external_id: i64,
        name: &str,
        location: &str,
        country: &str,
    ) -> Result<i64, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO launch_bases (external_id, name, location, country, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(external_id)
        .bind(name)
        .bind(location)
        .bind(country)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_launch_base(
        &self,
        id: i64,
        name: &str,
        location: &str,
        country: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE launch_bases
            SET name = ?, location = ?, country = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(location)
        .bind(country)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_launch_bases(&self) -> Result<Vec<LaunchBase>, AppError> {
        let bases = sqlx::query_as::<_, LaunchBase>("SELECT * FROM launch_bases ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(bases)
    }

    // =========================================================================
    // Rocket launch
    // =========================================================================

    /// Insert or update a launch by external id, returning the local id
    ///
    /// A missing provider or launch base link keeps the previously stored one.
    pub async fn upsert_rocket_launch(&self, launch: &NewRocketLaunch) -> Result<i64, AppError> {
        let now = Utc::now();

        let id: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO rocket_launches (
                external_id, cospar_id, sort_date, name, launch_date,
                launch_date_is_placeholder, provider_id, launch_base_id,
                mission_description, launch_description, window_open, t0,
                window_close, date_str, slug, weather_summary, weather_temp,
                weather_condition, weather_wind_mph, weather_icon, weather_updated,
                quicktext, suborbital, modified, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET
                cospar_id = excluded.cospar_id,
                sort_date = excluded.sort_date,
                name = excluded.name,
                launch_date = excluded.launch_date,
                launch_date_is_placeholder = excluded.launch_date_is_placeholder,
                provider_id = COALESCE(excluded.provider_id, rocket_launches.provider_id),
                launch_base_id = COALESCE(excluded.launch_base_id, rocket_launches.launch_base_id),
                mission_description = excluded.mission_description,
                launch_description = excluded.launch_description,
                window_open = excluded.window_open,
                t0 = excluded.t0,
                window_close = excluded.window_close,
                date_str = excluded.date_str,
                slug = excluded.slug,
                weather_summary = excluded.weather_summary,
                weather_temp = excluded.weather_temp,
                weather_condition = excluded.weather_condition,
                weather_wind_mph = excluded.weather_wind_mph,
                weather_icon = excluded.weather_icon,
                weather_updated = excluded.weather_updated,
                quicktext = excluded.quicktext,
                suborbital = excluded.suborbital,
                modified = excluded.modified,
                status = excluded.status,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(launch.external_id)
        .bind(&launch.cospar_id)
        .bind(&launch.sort_date)
        .bind(&launch.name)
        .bind(launch.launch_date)
        .bind(launch.launch_date_is_placeholder)
        .bind(launch.provider_id)
        .bind(launch.launch_base_id)
        .bind(&launch.mission_description)
        .bind(&launch.launch_description)
        .bind(launch.window_open)
        .bind(launch.t0)
        .bind(launch.window_close)
        .bind(&launch.date_str)
        .bind(&launch.slug)
        .bind(&launch.weather_summary)
        .bind(launch.weather_temp)
        .bind(&launch.weather_condition)
        .bind(launch.weather_wind_mph)
        .bind(&launch.weather_icon)
        .bind(launch.weather_updated)
        .bind(&launch.quicktext)
        .bind(launch.suborbital)
        .bind(launch.modified)
        .bind(&launch.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }

    /// Replace all missions of a launch in one transaction
    pub async fn replace_missions(
        &self,
        rocket_launch_id: i64,
        missions: &[NewMission],
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM rocket_launch_missions WHERE rocket_launch_id = ?")
            .bind(rocket_launch_id)
            .execute(&mut *tx)
            .await?;

        for mission in missions {
            sqlx::query(
                r#"
                INSERT INTO rocket_launch_missions (
                    rocket_launch_id, external_id, name, description, created_at
                ) VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(rocket_launch_id)
            .bind(mission.external_id)
            .bind(&mission.name)
            .bind(&mission.description)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_missions(
        &self,
        rocket_launch_id: i64,
    ) -> Result<Vec<RocketLaunchMission>, AppError> {
        let missions = sqlx::query_as::<_, RocketLaunchMission>(
            "SELECT * FROM rocket_launch_missions WHERE rocket_launch_id = ? ORDER BY id ASC",
        )
        .bind(rocket_launch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(missions)
    }

    /// Get launch by local id, missions included
    pub async fn get_rocket_launch(&self, id: i64) -> Result<Option<RocketLaunch>, AppError> {
        let launch = sqlx::query_as::<_, RocketLaunch>("SELECT * FROM rocket_launches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(mut launch) = launch else {
            return Ok(None);
        };
        launch.missions = self.get_missions(launch.id).await?;

        Ok(Some(launch))
    }

    pub async fn get_rocket_launch_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<RocketLaunch>, AppError> {
        let launch = sqlx::query_as::<_, RocketLaunch>(
            "SELECT * FROM rocket_launches WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut launch) = launch else {
            return Ok(None);
        };
        launch.missions = self.get_missions(launch.id).await?;

        Ok(Some(launch))
    }

    /// List launches, latest known time first
    ///
    /// # Arguments
    /// * `status` - Optional status filter
    pub async fn list_rocket_launches(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RocketLaunch>, AppError> {
        let launches = sqlx::query_as::<_, RocketLaunch>(
            r#"
            SELECT * FROM rocket_launches
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY COALESCE(t0, window_open, created_at) DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(launches)
    }

    pub async fn count_rocket_launches(&self, status: Option<&str>) -> Result<i64, AppError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM rocket_launches WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }
}
