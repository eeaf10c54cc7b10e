use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::{parse_id, ApiJson, WebError};
use super::AppState;
use crate::storage::Task;

#[derive(Debug, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl TaskInput {
    fn validate(&self) -> Result<(), WebError> {
        if self.title.trim().is_empty() {
            return Err(WebError::BadRequest("title must not be empty".to_string()));
        }
        Ok(())
    }
}

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, WebError> {
    Ok(Json(state.db.list_tasks().await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TaskInput>,
) -> Result<(StatusCode, Json<Task>), WebError> {
    input.validate()?;
    let id = state.db.create_task(&input.title, &input.description).await?;
    tracing::info!(id, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(Task {
            id,
            title: input.title,
            description: input.description,
        }),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, WebError> {
    let id = parse_id(&id)?;
    state
        .db
        .get_task(id)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("task {id} not found")))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TaskInput>,
) -> Result<StatusCode, WebError> {
    let id = parse_id(&id)?;
    input.validate()?;
    if !state.db.update_task(id, &input.title, &input.description).await? {
        return Err(WebError::NotFound(format!("task {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    let id = parse_id(&id)?;
    if !state.db.delete_task(id).await? {
        return Err(WebError::NotFound(format!("task {id} not found")));
    }
    tracing::info!(id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
