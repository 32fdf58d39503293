use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::types::{CachedFixtureSet, FixtureRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to serialize fixtures: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unsupported cache database '{0}:'. Only sqlite: URLs are accepted")]
    UnsupportedUrl(String),
}

#[derive(Debug, sqlx::FromRow)]
struct FixtureRow {
    week: String,
    data: String,
    updated_at: DateTime<Utc>,
}

/// Permanent fixture cache, one row per week/date key.
///
/// Entries are overwritten on every write for the same key and are never
/// expired or evicted.
#[derive(Debug, Clone)]
pub struct FixtureCache {
    pool: SqlitePool,
}

impl FixtureCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `url` (e.g. `sqlite://fixtures.db`), creating the
    /// database file when it does not exist yet.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        if !url.starts_with("sqlite:") {
            let scheme = url.split(':').next().unwrap_or_default().to_string();
            log::error!(
                "Fixture cache needs a sqlite: DATABASE_URL (e.g. sqlite://fixtures.db), got a {scheme}: URL"
            );
            return Err(StoreError::UnsupportedUrl(scheme));
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .inspect_err(|e| log::error!("Failed to open fixture cache at {url}: {e:?}"))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the `fixtures` table. Safe to call on every startup.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS fixtures (
                week        TEXT PRIMARY KEY,
                data        TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Writes `fixtures` under `key`, replacing whatever was stored there.
    pub async fn upsert(
        &self,
        key: &str,
        fixtures: &[FixtureRecord],
    ) -> Result<DateTime<Utc>, StoreError> {
        let data = serde_json::to_string(fixtures)?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO fixtures (week, data, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(week) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&data)
        .bind(now)
        .execute(&self.pool)
        .await
        .inspect_err(|e| log::error!("Failed to cache fixtures for {key}: {e:?}"))?;

        log::debug!("Cached {} fixture(s) under '{}'", fixtures.len(), key);
        Ok(now)
    }

    pub async fn lookup(&self, key: &str) -> Result<Option<CachedFixtureSet>, StoreError> {
        let row: Option<FixtureRow> =
            sqlx::query_as("SELECT week, data, updated_at FROM fixtures WHERE week = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .inspect_err(|e| log::error!("Failed to read cached fixtures for {key}: {e:?}"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(CachedFixtureSet {
            key: row.week,
            fixtures: serde_json::from_str(&row.data)?,
            updated_at: row.updated_at,
        }))
    }
}
