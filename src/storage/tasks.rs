use anyhow::Result;

use super::schema::Database;
use super::types::Task;

impl Database {
    // ========================================================================
    // Task Operations
    // ========================================================================

    /// Insert a task, returning its new id.
    pub async fn create_task(&self, title: &str, description: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO tasks (title, description) VALUES (?, ?)")
            .bind(title)
            .bind(description)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        tracing::info!(id, title = %title, "Created task");
        Ok(id)
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT id, title, description FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let tasks =
            sqlx::query_as::<_, Task>("SELECT id, title, description FROM tasks ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        tracing::debug!(count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    /// Overwrite title and description, returns whether the task exists
    pub async fn update_task(&self, id: i64, title: &str, description: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE tasks SET title = ?, description = ? WHERE id = ?")
            .bind(title)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a task, returns whether a row was removed
    pub async fn delete_task(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
