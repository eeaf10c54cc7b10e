use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use minijinja::context;
use serde::{Deserialize, Serialize};

use super::error::WebError;
use super::AppState;
use crate::storage::{Article, NewArticle};
use crate::util::{generate_preview, render_markdown, resolve_image_url, PREVIEW_WORDS};

#[derive(Debug, Serialize)]
struct ArticleView {
    id: i64,
    title: String,
    image: String,
    preview: String,
}

impl ArticleView {
    fn new(article: Article, image_base_url: &str) -> Self {
        Self {
            id: article.id,
            image: resolve_image_url(image_base_url, &article.image),
            title: article.title,
            preview: article.preview,
        }
    }
}

fn render<S: Serialize>(state: &AppState, name: &str, ctx: S) -> Result<Html<String>, WebError> {
    Ok(Html(state.templates.render(name, ctx)?))
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let articles: Vec<ArticleView> = state
        .db
        .list_articles()
        .await?
        .into_iter()
        .map(|a| ArticleView::new(a, &state.image_base_url))
        .collect();
    render(&state, "index.html", context! { articles })
}

pub async fn article(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return not_found_page(&state);
    };
    let article = match state.db.get_article(id).await {
        Ok(Some(article)) => article,
        Ok(None) => return not_found_page(&state),
        Err(e) => return WebError::from(e).into_response(),
    };

    let body_html = render_markdown(&article.text);
    let image = resolve_image_url(&state.image_base_url, &article.image);
    render(
        &state,
        "article.html",
        context! {
            title => article.title,
            image,
            body_html,
        },
    )
    .into_response()
}

pub async fn about(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let tasks = state.db.list_tasks().await?;
    render(&state, "about.html", context! { tasks })
}

pub async fn contact(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    render(&state, "contact.html", context! {})
}

pub async fn task_list(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let tasks = state.db.list_tasks().await?;
    render(&state, "task_list.html", context! { tasks })
}

pub async fn success(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    render(&state, "success.html", context! {})
}

pub async fn article_generator(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let enabled = state.generator.is_some();
    render(&state, "article_generator.html", context! { enabled })
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub prompt: String,
}

pub async fn generate_article(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, WebError> {
    let Some(generator) = state.generator.as_ref() else {
        return Err(WebError::Unavailable(
            "article generation is not configured".to_string(),
        ));
    };
    let draft = generator.generate(&form.prompt).await?;
    render(
        &state,
        "generated_article.html",
        context! {
            prompt => form.prompt,
            draft,
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct AcceptForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub article_text: String,
}

pub async fn accept_article(
    State(state): State<AppState>,
    Form(form): Form<AcceptForm>,
) -> Result<Redirect, WebError> {
    if form.title.trim().is_empty() {
        return Err(WebError::BadRequest("title must not be empty".to_string()));
    }
    let article = NewArticle {
        preview: generate_preview(&form.article_text, PREVIEW_WORDS),
        title: form.title,
        image: form.image_url,
        text: form.article_text,
    };
    let id = state.db.create_article(&article).await?;
    tracing::info!(id, title = %article.title, "Generated article accepted");
    Ok(Redirect::to("/success"))
}

fn not_found_page(state: &AppState) -> Response {
    match state.templates.render("404.html", context! {}) {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render 404 page");
            (StatusCode::NOT_FOUND, "404 page not found").into_response()
        }
    }
}

pub async fn not_found(State(state): State<AppState>) -> Response {
    not_found_page(&state)
}
