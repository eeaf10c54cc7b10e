use anyhow::Result;
use chrono::{DateTime, Utc};

use super::schema::Database;
use super::types::FrontendLog;

/// Maximum number of log entries returned by a listing
const MAX_LOGS: i64 = 5000;

impl Database {
    // ========================================================================
    // Frontend Log Operations
    // ========================================================================

    /// Store a client-submitted log entry, returning its id.
    pub async fn insert_frontend_log(
        &self,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        let result = sqlx::query("INSERT INTO frontend_logs (message, timestamp) VALUES (?, ?)")
            .bind(message)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, "Inserted frontend log");
        Ok(id)
    }

    pub async fn get_frontend_log(&self, id: i64) -> Result<Option<FrontendLog>> {
        let entry = sqlx::query_as::<_, FrontendLog>(
            "SELECT id, message, timestamp FROM frontend_logs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Most recent entries last, capped at MAX_LOGS.
    pub async fn list_frontend_logs(&self) -> Result<Vec<FrontendLog>> {
        let entries = sqlx::query_as::<_, FrontendLog>(
            "SELECT id, message, timestamp FROM frontend_logs ORDER BY id LIMIT ?",
        )
        .bind(MAX_LOGS)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Overwrite message and timestamp, returns whether the entry exists
    pub async fn update_frontend_log(
        &self,
        id: i64,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE frontend_logs SET message = ?, timestamp = ? WHERE id = ?")
                .bind(message)
                .bind(timestamp)
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_frontend_log(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM frontend_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
