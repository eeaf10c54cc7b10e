use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

use super::error::WebError;
use super::AppState;
use crate::files::{FileError, StoredFile};

const FAVICON_PATH: &str = "images/favicon.ico";

/// Strong ETag over the file contents.
pub fn etag_for(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let hex: String = digest[..16].iter().map(|b| format!("{b:02x}")).collect();
    format!("\"{hex}\"")
}

fn if_none_match_hits(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"))
}

fn file_response(file: StoredFile, headers: &HeaderMap) -> Response {
    let etag = etag_for(&file.data);
    let etag_value = HeaderValue::from_str(&etag).ok();

    if if_none_match_hits(headers, &etag) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        if let Some(value) = etag_value {
            response.headers_mut().insert(header::ETAG, value);
        }
        return response;
    }

    let mut response = file.data.into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(file.content_type),
    );
    response_headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    if let Some(value) = etag_value {
        response_headers.insert(header::ETAG, value);
    }
    response
}

async fn serve(state: &AppState, path: &str, headers: &HeaderMap) -> Result<Response, WebError> {
    match state.files.get_file(path).await {
        Ok(file) => Ok(file_response(file, headers)),
        Err(FileError::NotFound(_)) | Err(FileError::InvalidPath(_)) => {
            Err(WebError::NotFound(format!("file {path} not found")))
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Failed to read static file");
            Err(WebError::Internal(e.into()))
        }
    }
}

pub async fn static_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    serve(&state, &path, &headers).await
}

pub async fn favicon(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    serve(&state, FAVICON_PATH, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_is_stable_and_quoted() {
        let a = etag_for(b"body{}");
        assert_eq!(a, etag_for(b"body{}"));
        assert_ne!(a, etag_for(b"body{ }"));
        assert!(a.starts_with('"') && a.ends_with('"'));
        assert_eq!(a.len(), 34);
    }

    #[test]
    fn test_if_none_match_list() {
        let etag = etag_for(b"x");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_str(&format!("\"other\", {etag}")).unwrap(),
        );
        assert!(if_none_match_hits(&headers, &etag));
        assert!(!if_none_match_hits(&HeaderMap::new(), &etag));
    }

    #[test]
    fn test_not_modified_response() {
        let file = StoredFile::new("a.css", b"a{}".to_vec());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_str(&etag_for(b"a{}")).unwrap(),
        );
        let response = file_response(file, &headers);
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }
}
