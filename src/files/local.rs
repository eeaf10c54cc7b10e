use std::path::PathBuf;

use async_trait::async_trait;

use super::{key_segments, FileError, FileStorage, StoredFile};

/// Serves files from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

fn not_found_or_io(err: std::io::Error, path: &str) -> FileError {
    if err.kind() == std::io::ErrorKind::NotFound {
        FileError::NotFound(path.to_string())
    } else {
        FileError::Io(err)
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn get_file(&self, path: &str) -> Result<StoredFile, FileError> {
        let segments = key_segments(path)?;
        let mut full = self.base_path.clone();
        full.extend(&segments);

        // Symlinks inside the base directory must not lead out of it
        let root = tokio::fs::canonicalize(&self.base_path)
            .await
            .map_err(|e| not_found_or_io(e, path))?;
        let resolved = tokio::fs::canonicalize(&full)
            .await
            .map_err(|e| not_found_or_io(e, path))?;
        if !resolved.starts_with(&root) {
            tracing::warn!(path = %path, "Rejected file path resolving outside the storage root");
            return Err(FileError::InvalidPath(path.to_string()));
        }

        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| not_found_or_io(e, path))?;
        if !meta.is_file() {
            return Err(FileError::NotFound(path.to_string()));
        }

        let data = tokio::fs::read(&resolved)
            .await
            .map_err(|e| not_found_or_io(e, path))?;
        tracing::debug!(path = %path, bytes = data.len(), "Read local file");
        Ok(StoredFile::new(path, data))
    }
}
