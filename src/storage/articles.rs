use anyhow::Result;

use super::schema::Database;
use super::types::{Article, NewArticle};

/// Maximum number of articles to return from a single listing (OOM protection)
const MAX_ARTICLES: i64 = 2000;

impl Database {
    // ========================================================================
    // Article Mutations
    // ========================================================================

    /// Insert an article, returning its new id.
    pub async fn create_article(&self, article: &NewArticle) -> Result<i64> {
        tracing::debug!(title = %article.title, image = %article.image, "Creating article");

        let result = sqlx::query(
            "INSERT INTO articles (title, image, preview, text) VALUES (?, ?, ?, ?)",
        )
        .bind(&article.title)
        .bind(&article.image)
        .bind(&article.preview)
        .bind(&article.text)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(id, title = %article.title, "Created article");
        Ok(id)
    }

    /// Replace every column of an article and return the stored row.
    ///
    /// Returns `None` when no article has the given id.
    pub async fn update_article(&self, id: i64, article: &NewArticle) -> Result<Option<Article>> {
        let updated = sqlx::query_as::<_, Article>(
            r#"
            UPDATE articles SET title = ?, image = ?, preview = ?, text = ?
            WHERE id = ?
            RETURNING id, title, image, preview, text
        "#,
        )
        .bind(&article.title)
        .bind(&article.image)
        .bind(&article.preview)
        .bind(&article.text)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            tracing::info!(id, "Updated article");
        }
        Ok(updated)
    }

    /// Delete an article, returns whether a row was removed
    pub async fn delete_article(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        tracing::info!(id, deleted, "Delete article");
        Ok(deleted)
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Get a single article by its ID.
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT id, title, image, preview, text FROM articles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// All articles in insertion order, capped at MAX_ARTICLES.
    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(
            "SELECT id, title, image, preview, text FROM articles ORDER BY id LIMIT ?",
        )
        .bind(MAX_ARTICLES)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = articles.len(), "Fetched articles");
        Ok(articles)
    }
}
