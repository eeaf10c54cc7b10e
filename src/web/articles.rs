use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::error::{parse_id, ApiJson, WebError};
use super::AppState;
use crate::storage::{Article, ArticlePatch, NewArticle};
use crate::util::{generate_preview, PREVIEW_WORDS};

/// Rejects blank titles and fills a blank preview from the text.
fn prepare(mut article: NewArticle) -> Result<NewArticle, WebError> {
    if article.title.trim().is_empty() {
        return Err(WebError::BadRequest("title must not be empty".to_string()));
    }
    if article.preview.trim().is_empty() {
        article.preview = generate_preview(&article.text, PREVIEW_WORDS);
    }
    Ok(article)
}

pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, WebError> {
    Ok(Json(state.db.list_articles().await?))
}

pub async fn create_article(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewArticle>,
) -> Result<(StatusCode, Json<Article>), WebError> {
    let article = prepare(input)?;
    let id = state.db.create_article(&article).await?;
    tracing::info!(id, title = %article.title, "Article created");
    Ok((
        StatusCode::CREATED,
        Json(Article {
            id,
            title: article.title,
            image: article.image,
            preview: article.preview,
            text: article.text,
        }),
    ))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, WebError> {
    let id = parse_id(&id)?;
    state
        .db
        .get_article(id)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("article {id} not found")))
}

/// Partial update: fields missing from the body keep their value.
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ArticlePatch>,
) -> Result<Json<Article>, WebError> {
    let id = parse_id(&id)?;
    let Some(current) = state.db.get_article(id).await? else {
        return Err(WebError::NotFound(format!("article {id} not found")));
    };
    let merged = prepare(patch.apply(&current))?;
    state
        .db
        .update_article(id, &merged)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("article {id} not found")))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    let id = parse_id(&id)?;
    if !state.db.delete_article(id).await? {
        return Err(WebError::NotFound(format!("article {id} not found")));
    }
    tracing::info!(id, "Article deleted");
    Ok(StatusCode::NO_CONTENT)
}
