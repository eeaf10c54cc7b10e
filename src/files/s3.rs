use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use lru::LruCache;
use url::Url;

use super::{key_segments, FileError, FileStorage, StoredFile};

/// Largest object served from the bucket (10 MB).
const MAX_OBJECT_SIZE: usize = 10 * 1024 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RETRIES: u32 = 2;

/// Serves files from an S3 bucket over plain HTTPS GETs.
///
/// Objects must be publicly readable (or fronted by a compatible gateway);
/// requests are not signed. Fetched objects are kept in an LRU cache.
pub struct S3FileStorage {
    client: reqwest::Client,
    base: Url,
    cache: Option<Mutex<LruCache<String, StoredFile>>>,
}

impl S3FileStorage {
    /// Creates a bucket client.
    ///
    /// Without `endpoint` objects are addressed virtual-host style
    /// (`https://{bucket}.s3.{region}.amazonaws.com/{key}`); with one they are
    /// addressed path style (`{endpoint}/{bucket}/{key}`).
    pub fn new(
        client: reqwest::Client,
        region: &str,
        bucket: &str,
        endpoint: Option<&str>,
        cache_capacity: usize,
    ) -> Result<Self, FileError> {
        if bucket.is_empty() {
            return Err(FileError::Config("storage.bucket is empty".to_string()));
        }

        let base = match endpoint {
            Some(endpoint) => {
                let mut base = Url::parse(endpoint)
                    .map_err(|e| FileError::Config(format!("storage.endpoint: {e}")))?;
                base.path_segments_mut()
                    .map_err(|_| FileError::Config("storage.endpoint cannot be a base".into()))?
                    .pop_if_empty()
                    .push(bucket)
                    .push("");
                base
            }
            None => Url::parse(&format!("https://{bucket}.s3.{region}.amazonaws.com/"))
                .map_err(|e| FileError::Config(format!("bucket or region: {e}")))?,
        };

        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));

        Ok(Self {
            client,
            base,
            cache,
        })
    }

    /// URL of the object stored under `key`.
    pub fn object_url(&self, key: &str) -> Result<Url, FileError> {
        let segments = key_segments(key)?;
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FileError::InvalidPath(key.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn cached(&self, key: &str) -> Option<StoredFile> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().ok()?;
        cache.get(key).cloned()
    }

    fn remember(&self, key: &str, file: &StoredFile) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.put(key.to_string(), file.clone());
            }
        }
    }

    /// GET with exponential backoff on transient failures: 250ms, 500ms.
    async fn fetch_with_retry(&self, url: &Url, key: &str) -> Result<Vec<u8>, FileError> {
        let mut retry_count = 0;
        loop {
            match self.fetch(url, key).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                    let delay = 250u64 << retry_count;
                    tracing::debug!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay,
                        "Retrying S3 fetch after transient error"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch(&self, url: &Url, key: &str) -> Result<Vec<u8>, FileError> {
        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.client.get(url.clone()).send())
            .await
            .map_err(|_| FileError::Timeout)?
            .map_err(FileError::Network)?;

        let status = response.status().as_u16();
        match status {
            200..=299 => read_limited_bytes(response, MAX_OBJECT_SIZE).await,
            // Public buckets answer 403 for keys that do not exist
            403 | 404 => Err(FileError::NotFound(key.to_string())),
            other => Err(FileError::HttpStatus(other)),
        }
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    async fn get_file(&self, path: &str) -> Result<StoredFile, FileError> {
        let url = self.object_url(path)?;
        if let Some(file) = self.cached(path) {
            tracing::trace!(key = %path, "S3 object cache hit");
            return Ok(file);
        }

        let data = self.fetch_with_retry(&url, path).await?;
        tracing::debug!(key = %path, bytes = data.len(), "Fetched S3 object");
        let file = StoredFile::new(path, data);
        self.remember(path, &file);
        Ok(file)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FileError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FileError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FileError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FileError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
