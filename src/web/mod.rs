//! HTTP surface: JSON REST endpoints, GraphQL, HTML pages and static files.
mod articles;
mod error;
mod frontend_logs;
mod middleware;
mod pages;
mod static_files;
mod tasks;
mod templates;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::AuthService;
use crate::files::FileStorage;
use crate::generator::ArticleGenerator;
use crate::graphql::{build_schema, AppSchema, BearerClaims};
use crate::storage::Database;

use error::ApiJson;
pub use error::WebError;
pub use static_files::etag_for;
pub use templates::Templates;

/// Shared handler state. Cloned per request; every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub files: Arc<dyn FileStorage>,
    pub auth: Arc<AuthService>,
    pub generator: Option<Arc<ArticleGenerator>>,
    pub templates: Arc<Templates>,
    pub schema: AppSchema,
    pub image_base_url: Arc<str>,
}

impl AppState {
    pub fn new(
        db: Database,
        files: Arc<dyn FileStorage>,
        auth: Arc<AuthService>,
        generator: Option<ArticleGenerator>,
        templates: Templates,
        image_base_url: &str,
    ) -> Self {
        let schema = build_schema(db.clone(), Arc::clone(&auth), image_base_url.to_string());
        Self {
            db,
            files,
            auth,
            generator: generator.map(Arc::new),
            templates: Arc::new(templates),
            schema,
            image_base_url: Arc::from(image_base_url),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/article/:id", get(pages::article))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/task_list", get(pages::task_list))
        .route("/success", get(pages::success))
        .route("/article-generator", get(pages::article_generator))
        .route("/generate-article", post(pages::generate_article))
        .route("/accept-article", post(pages::accept_article))
        // GraphQL
        .route("/graphql", get(graphiql).post(graphql))
        // REST
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/articles",
            get(articles::list_articles).post(articles::create_article),
        )
        .route(
            "/articles/:id",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        )
        .route(
            "/frontend-logs",
            get(frontend_logs::list_logs).post(frontend_logs::create_log),
        )
        .route(
            "/frontend-logs/:id",
            get(frontend_logs::get_log)
                .put(frontend_logs::update_log)
                .delete(frontend_logs::delete_log),
        )
        .route("/log", post(frontend_logs::beacon))
        // Static files
        .route("/static/*path", get(static_files::static_file))
        .route("/favicon.ico", get(static_files::favicon))
        .fallback(pages::not_found)
        .layer(axum::middleware::from_fn(middleware::cors))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}

// ============================================================================
// GraphQL
// ============================================================================

/// Claims from a valid `Authorization: Bearer` header. Invalid tokens are
/// treated as anonymous.
fn bearer_claims(auth: &AuthService, headers: &HeaderMap) -> Option<BearerClaims> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    match auth.verify_token(token) {
        Ok(claims) => Some(BearerClaims(claims)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid bearer token");
            None
        }
    }
}

async fn graphql(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let mut request = request;
    if let Some(claims) = bearer_claims(&state.auth, &headers) {
        request = request.data(claims);
    }
    Json(state.schema.execute(request).await)
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}
