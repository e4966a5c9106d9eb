//! Durable string-keyed JSON cache backed by SQLite.
//!
//! Every collection the data layer owns persists here first; the
//! remote store is only ever a mirror. Values are JSON; a value that
//! no longer parses is reset to absent rather than trusted.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::DataError;

/// Cache key builders, one per stored collection.
pub mod keys {
    pub const LIBRARY_ACTIVITIES: &str = "library-activities";
    pub const USER_LESSON_PLANS: &str = "user-created-lesson-plans";

    pub fn lesson_data(class: &str) -> String {
        format!("lesson-data-{}", class)
    }

    pub fn units(class: &str) -> String {
        format!("units-{}", class)
    }

    pub fn half_terms(class: &str) -> String {
        format!("half-terms-{}", class)
    }

    pub fn tags_structured(class: &str) -> String {
        format!("tags-structured-{}", class)
    }

    pub fn tags_flat(class: &str) -> String {
        format!("tags-flat-{}", class)
    }
}

/// Local durable key-value store.
#[derive(Debug, Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    /// Opens (creating if needed) the cache database at `path`.
    pub async fn open(path: &Path) -> Result<Self, DataError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cache(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Reads and decodes a value.
    ///
    /// Returns `Ok(None)` for an absent key. An entry that fails to
    /// decode is logged, deleted and reported as absent so callers
    /// fall back to their defaults.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DataError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some((raw,)) = row else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "resetting unparsable cache entry");
                self.remove(key).await?;
                Ok(None)
            }
        }
    }

    /// Encodes and writes a value, replacing any previous entry.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DataError> {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO cache(key, value, updated_at) VALUES(?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), DataError> {
        sqlx::query("DELETE FROM cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn contains(&self, key: &str) -> Result<bool, DataError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
