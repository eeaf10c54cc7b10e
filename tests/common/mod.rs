//! Shared setup for the HTTP integration tests: a real server on an
//! ephemeral port, backed by an in-memory database and the repository's
//! templates and static files.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use secrecy::SecretString;

use newsdesk::auth::AuthService;
use newsdesk::files::LocalFileStorage;
use newsdesk::generator::ArticleGenerator;
use newsdesk::storage::Database;
use newsdesk::web::{build_router, AppState, Templates};

pub struct TestApp {
    pub base_url: String,
    pub db: Database,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> reqwest::Response {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.client
            .post(self.url(path))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .unwrap()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_generator(None).await
}

pub async fn spawn_app_with_generator(generator: Option<ArticleGenerator>) -> TestApp {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let db = Database::open(":memory:").await.unwrap();
    let files = Arc::new(LocalFileStorage::new(root.join("static")));
    // Minimum bcrypt cost keeps registration fast
    let auth = Arc::new(AuthService::new(
        SecretString::from("integration-test-secret".to_string()),
        4,
        Duration::hours(24),
    ));
    let templates = Templates::load(&root.join("templates")).unwrap();

    let state = AppState::new(db.clone(), files, auth, generator, templates, "/static/");
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        base_url: format!("http://{addr}"),
        db,
        client,
    }
}
