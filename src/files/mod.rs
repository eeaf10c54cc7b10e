//! Static file storage backends.
//!
//! Files are addressed by a relative, `/`-separated key such as
//! `css/site.css`. The web layer serves them under `/static/`.
mod local;
mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StorageConfig;

pub use local::LocalFileStorage;
pub use s3::S3FileStorage;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid file path: {0}")]
    InvalidPath(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("File too large (exceeds {0} bytes)")]
    TooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

impl FileError {
    /// Returns true if this error is transient and the fetch should be retried.
    fn is_retryable(&self) -> bool {
        match self {
            FileError::Timeout | FileError::Network(_) => true,
            FileError::HttpStatus(status) => *status >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Storage Trait
// ============================================================================

/// File contents plus the content type served with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

impl StoredFile {
    pub fn new(key: &str, data: Vec<u8>) -> Self {
        Self {
            data,
            content_type: content_type_for(key),
        }
    }
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Fetches the file stored under `path`.
    async fn get_file(&self, path: &str) -> Result<StoredFile, FileError>;
}

/// Builds the backend selected by `storage.use_s3`.
pub fn build_file_storage(config: &StorageConfig) -> Result<Arc<dyn FileStorage>, FileError> {
    if config.use_s3 {
        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Serving static files from S3"
        );
        let storage = S3FileStorage::new(
            reqwest::Client::new(),
            &config.region,
            &config.bucket,
            config.endpoint.as_deref(),
            config.cache_capacity,
        )?;
        Ok(Arc::new(storage))
    } else {
        tracing::info!(path = %config.base_path.display(), "Serving static files from disk");
        Ok(Arc::new(LocalFileStorage::new(config.base_path.clone())))
    }
}

/// Splits a file key into path segments.
///
/// Empty and `.` segments are dropped. Absolute keys, `..` segments and
/// backslashes are rejected, as is a key with no segments left.
pub(crate) fn key_segments(path: &str) -> Result<Vec<&str>, FileError> {
    if path.starts_with('/') || path.contains('\\') {
        return Err(FileError::InvalidPath(path.to_string()));
    }
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(FileError::InvalidPath(path.to_string())),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(FileError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Content type from the file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" | "md" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
