//! SQLite implementation of `LocalStorage`.
//!
//! One row per key in `local_storage`. Values are opaque JSON strings; the
//! stores in inkstand-core own their shape.

use chrono::Utc;
use inkstand_core::storage::LocalStorage;
use inkstand_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;

pub struct SqliteLocalStorage {
    pool: DatabasePool,
}

impl SqliteLocalStorage {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl LocalStorage for SqliteLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| r.try_get::<String, _>("value"))
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO local_storage (key, value, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }
}
