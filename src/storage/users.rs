use anyhow::Result;

use super::schema::Database;
use super::types::User;

/// Role assigned to every self-registered account
const DEFAULT_ROLE_ID: i64 = 1;

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create an account and its login data in a single transaction.
    ///
    /// The account row is inserted first and its id becomes the user id of
    /// the login row. If either insert fails (e.g. the email is already
    /// taken) nothing is written.
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64> {
        tracing::debug!(email = %email, "Creating user");
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO user_accounts (role_id) VALUES (?)")
            .bind(DEFAULT_ROLE_ID)
            .execute(&mut *tx)
            .await?;
        let user_id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO user_login_data (user_id, email_address, password_hash) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id, email = %email, "Created user");
        Ok(user_id)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email_address AS email, password_hash
            FROM user_login_data
            WHERE email_address = ?
        "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email_address AS email, password_hash
            FROM user_login_data
            WHERE user_id = ?
        "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{is_unique_violation, Database};

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn count(db: &Database, table: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&db.pool)
            .await
            .unwrap();
        row.0
    }

    #[tokio::test]
    async fn test_create_user_and_lookup() {
        let db = test_db().await;
        let id = db
            .create_user("john.doe@example.com", "hashedpassword")
            .await
            .unwrap();

        let by_email = db
            .get_user_by_email("john.doe@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.user_id, id);
        assert_eq!(by_email.password_hash, "hashedpassword");

        let by_id = db.get_user_by_id(id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "john.doe@example.com");
    }

    #[tokio::test]
    async fn test_unknown_email_is_none() {
        let db = test_db().await;
        assert!(db
            .get_user_by_email("notfound@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rolls_back_account_row() {
        let db = test_db().await;
        db.create_user("dup@example.com", "h1").await.unwrap();

        let err = db.create_user("dup@example.com", "h2").await.unwrap_err();
        assert!(is_unique_violation(&err));

        // The second account row must not survive the failed login insert
        assert_eq!(count(&db, "user_accounts").await, 1);
        assert_eq!(count(&db, "user_login_data").await, 1);
    }
}
