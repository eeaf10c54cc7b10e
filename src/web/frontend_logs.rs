use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::{parse_id, ApiJson, WebError};
use super::AppState;
use crate::storage::FrontendLog;
use crate::util::clean_log_message;

#[derive(Debug, Deserialize)]
pub struct FrontendLogInput {
    #[serde(default)]
    pub message: String,
    /// RFC 3339; defaults to the time the entry is received.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrontendLogPatch {
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

fn clean_message(message: &str) -> Result<String, WebError> {
    clean_log_message(message).map_err(|e| WebError::BadRequest(e.to_string()))
}

async fn store(state: &AppState, input: FrontendLogInput) -> Result<FrontendLog, WebError> {
    let message = clean_message(&input.message)?;
    let timestamp = input.timestamp.unwrap_or_else(Utc::now);
    let id = state.db.insert_frontend_log(&message, timestamp).await?;
    tracing::warn!(id, message = %message, "Frontend reported");
    Ok(FrontendLog {
        id,
        message,
        timestamp,
    })
}

pub async fn list_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<FrontendLog>>, WebError> {
    Ok(Json(state.db.list_frontend_logs().await?))
}

pub async fn create_log(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<FrontendLogInput>,
) -> Result<(StatusCode, Json<FrontendLog>), WebError> {
    let entry = store(&state, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Beacon endpoint for client scripts: stores the entry and answers 200
/// with an empty body.
pub async fn beacon(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<FrontendLogInput>,
) -> Result<StatusCode, WebError> {
    store(&state, input).await?;
    Ok(StatusCode::OK)
}

pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FrontendLog>, WebError> {
    let id = parse_id(&id)?;
    state
        .db
        .get_frontend_log(id)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("frontend log {id} not found")))
}

/// Empty or missing fields keep the stored value.
pub async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<FrontendLogPatch>,
) -> Result<Json<FrontendLog>, WebError> {
    let id = parse_id(&id)?;
    let Some(current) = state.db.get_frontend_log(id).await? else {
        return Err(WebError::NotFound(format!("frontend log {id} not found")));
    };

    let message = match patch.message.filter(|m| !m.trim().is_empty()) {
        Some(m) => clean_message(&m)?,
        None => current.message,
    };
    let timestamp = patch.timestamp.unwrap_or(current.timestamp);

    if !state.db.update_frontend_log(id, &message, timestamp).await? {
        return Err(WebError::NotFound(format!("frontend log {id} not found")));
    }
    Ok(Json(FrontendLog {
        id,
        message,
        timestamp,
    }))
}

pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    let id = parse_id(&id)?;
    if !state.db.delete_frontend_log(id).await? {
        return Err(WebError::NotFound(format!("frontend log {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
