//! Directory-based SQL migrations.
//!
//! Every `*.sql` file in the directory is executed once per run, in lexical
//! file-name order. Files are not tracked, so scripts should be idempotent
//! (`CREATE TABLE IF NOT EXISTS`, `INSERT OR IGNORE`).
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::storage::Database;

/// Lists the `.sql` files of `dir` in lexical order.
pub async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read migration directory {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path).await?.is_file();
        if is_file && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Runs every migration script in `dir` against `db`.
///
/// Stops at the first failing script; scripts before it stay applied.
/// Returns the file names that ran.
pub async fn run_migrations(db: &Database, dir: &Path) -> Result<Vec<String>> {
    let files = migration_files(dir).await?;
    let mut applied = Vec::with_capacity(files.len());

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sql = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read migration {}", path.display()))?;

        tracing::info!(file = %name, "Applying migration");
        sqlx::raw_sql(&sql)
            .execute(&db.pool)
            .await
            .with_context(|| format!("Migration {} failed", name))?;
        applied.push(name);
    }

    tracing::info!(count = applied.len(), "Migrations complete");
    Ok(applied)
}
