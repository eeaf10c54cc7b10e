//! Integration tests for the storage layer: articles, tasks, frontend logs
//! and users across a reopened on-disk database, plus the bundled migrations.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::path::Path;

use newsdesk::migration::run_migrations;
use newsdesk::storage::{ArticlePatch, Database, NewArticle};

fn new_article(title: &str) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        image: "images/cover.jpg".to_string(),
        preview: "Preview".to_string(),
        text: "Body".to_string(),
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.db");
    let path = path.to_str().unwrap();

    let db = Database::open(path).await.unwrap();
    let article_id = db.create_article(&new_article("Kept")).await.unwrap();
    let task_id = db.create_task("Edit", "Proofread").await.unwrap();
    let logged_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    let log_id = db.insert_frontend_log("boom", logged_at).await.unwrap();
    let user_id = db.create_user("ada@example.com", "$2b$hash").await.unwrap();
    db.close().await;

    let db = Database::open(path).await.unwrap();
    assert_eq!(db.get_article(article_id).await.unwrap().unwrap().title, "Kept");
    assert_eq!(db.get_task(task_id).await.unwrap().unwrap().description, "Proofread");
    assert_eq!(db.get_frontend_log(log_id).await.unwrap().unwrap().timestamp, logged_at);
    let user = db.get_user_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(user.user_id, user_id);
    db.close().await;
}

// ============================================================================
// Articles
// ============================================================================

#[tokio::test]
async fn test_article_patch_then_delete() {
    let db = Database::open(":memory:").await.unwrap();
    let id = db.create_article(&new_article("Draft")).await.unwrap();

    let current = db.get_article(id).await.unwrap().unwrap();
    let patch = ArticlePatch {
        title: Some("Final".to_string()),
        ..ArticlePatch::default()
    };
    let updated = db
        .update_article(id, &patch.apply(&current))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.image, "images/cover.jpg");

    assert!(db.delete_article(id).await.unwrap());
    assert!(!db.delete_article(id).await.unwrap());
    assert!(db.list_articles().await.unwrap().is_empty());
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let db = Database::open(":memory:").await.unwrap();
    db.create_user("dup@example.com", "h1").await.unwrap();

    let err = db.create_user("dup@example.com", "h2").await.unwrap_err();
    assert!(newsdesk::storage::is_unique_violation(&err));

    let user = db.get_user_by_email("dup@example.com").await.unwrap().unwrap();
    assert_eq!(user.password_hash, "h1");
}

// ============================================================================
// Migrations
// ============================================================================

#[tokio::test]
async fn test_bundled_migrations_seed_tasks_once() {
    let db = Database::open(":memory:").await.unwrap();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");

    let applied = run_migrations(&db, &dir).await.unwrap();
    assert_eq!(
        applied,
        vec!["001_seed_tasks.sql".to_string(), "002_frontend_log_index.sql".to_string()]
    );
    let seeded = db.list_tasks().await.unwrap().len();
    assert_eq!(seeded, 2);

    // Re-running does not duplicate seed rows
    run_migrations(&db, &dir).await.unwrap();
    assert_eq!(db.list_tasks().await.unwrap().len(), seeded);
}
