use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Schema setup failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN stays `Other`: it means a bad path or permissions.
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

/// Returns true when an error produced by a storage call is a UNIQUE
/// constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

// ============================================================================
// Articles
// ============================================================================

/// A published article.
///
/// `image` is either a path relative to the image base URL or an absolute
/// `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub preview: String,
    pub text: String,
}

/// Column values for inserting or fully replacing an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewArticle {
    pub title: String,
    pub image: String,
    pub preview: String,
    pub text: String,
}

/// Partial article update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub image: Option<String>,
    pub preview: Option<String>,
    pub text: Option<String>,
}

impl ArticlePatch {
    /// Merge the patch over an existing article.
    pub fn apply(self, current: &Article) -> NewArticle {
        NewArticle {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            image: self.image.unwrap_or_else(|| current.image.clone()),
            preview: self.preview.unwrap_or_else(|| current.preview.clone()),
            text: self.text.unwrap_or_else(|| current.text.clone()),
        }
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
}

// ============================================================================
// Frontend Logs
// ============================================================================

/// A diagnostic message submitted by the browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FrontendLog {
    pub id: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Users
// ============================================================================

/// A registered user joined from `user_accounts` and `user_login_data`.
///
/// The password hash never leaves the process: it is skipped on
/// serialization and masked in `Debug`.
#[derive(Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
