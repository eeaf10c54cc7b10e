//! End-to-end tests for the REST endpoints, pages and static files.
//!
//! Each test starts its own server with a private in-memory database.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{spawn_app, spawn_app_with_generator};
use newsdesk::generator::ArticleGenerator;
use newsdesk::storage::NewArticle;

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn task_crud_lifecycle() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/tasks"))
        .json(&json!({ "title": "Write docs", "description": "API reference" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Write docs");

    let fetched: Value = app
        .client
        .get(app.url(&format!("/tasks/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        fetched,
        json!({ "id": id, "title": "Write docs", "description": "API reference" })
    );

    let response = app
        .client
        .put(app.url(&format!("/tasks/{id}")))
        .json(&json!({ "title": "Write more docs", "description": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let task = app.db.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.title, "Write more docs");

    let list: Vec<Value> = app
        .client
        .get(app.url("/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    let response = app
        .client
        .delete(app.url(&format!("/tasks/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .client
        .get(app.url(&format!("/tasks/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn task_bad_requests() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/tasks/abc")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .post(app.url("/tasks"))
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .delete(app.url("/tasks/12345"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = spawn_app().await;

    let cases = [
        ("/tasks", r#"{"title": "#),
        ("/tasks", r#"{"title": 42}"#),
        ("/articles", r#"{"title": ["not", "a", "string"]}"#),
        ("/frontend-logs", r#"{"message": "x", "timestamp": "yesterday"}"#),
    ];
    for (route, body) in cases {
        let response = app
            .client
            .post(app.url(route))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{route} {body}");
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("application/json"), "{route} {body}");
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string(), "{route} {body}");
    }

    // Missing content type
    let response = app
        .client
        .post(app.url("/tasks"))
        .body(r#"{"title": "t"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].is_string());
    assert!(app.db.list_tasks().await.unwrap().is_empty());
}

// ============================================================================
// Articles
// ============================================================================

#[tokio::test]
async fn article_create_update_delete() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/articles"))
        .json(&json!({
            "title": "Launch",
            "image": "images/launch.png",
            "text": "We are live today with a brand new site"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["preview"], "We are live today with a brand new site");

    let updated: Value = app
        .client
        .put(app.url(&format!("/articles/{id}")))
        .json(&json!({ "title": "Launch day" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["title"], "Launch day");
    assert_eq!(updated["image"], "images/launch.png");

    let response = app
        .client
        .put(app.url("/articles/999"))
        .json(&json!({ "title": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .client
        .delete(app.url(&format!("/articles/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.db.get_article(id).await.unwrap().is_none());
}

// ============================================================================
// Frontend logs
// ============================================================================

#[tokio::test]
async fn frontend_log_endpoints() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/frontend-logs"))
        .json(&json!({ "message": "ReferenceError: foo", "timestamp": "2024-06-01T12:00:00Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = app
        .client
        .post(app.url("/log"))
        .json(&json!({ "message": "beacon without timestamp" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logs = app.db.list_frontend_logs().await.unwrap();
    assert_eq!(logs.len(), 2);

    let updated: Value = app
        .client
        .put(app.url(&format!("/frontend-logs/{id}")))
        .json(&json!({ "message": "" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["message"], "ReferenceError: foo");

    let response = app
        .client
        .delete(app.url(&format!("/frontend-logs/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .client
        .post(app.url("/log"))
        .json(&json!({ "message": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn cors_preflight_and_headers() {
    let app = spawn_app().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/tasks"))
        .header("origin", "https://frontend.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET, POST, PUT, DELETE"
    );
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );

    let response = app.client.get(app.url("/tasks")).send().await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn index_and_article_pages() {
    let app = spawn_app().await;
    let id = app
        .db
        .create_article(&NewArticle {
            title: "Markdown <b>test</b>".to_string(),
            image: "images/placeholder.svg".to_string(),
            preview: "A short preview".to_string(),
            text: "## Section\n\nSome **bold** text <script>alert(1)</script>".to_string(),
        })
        .await
        .unwrap();

    let index = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    let body = index.text().await.unwrap();
    // Titles are escaped, not interpreted
    assert!(body.contains("Markdown &lt;b&gt;test"));
    assert!(!body.contains("<b>test</b>"));
    assert!(body.contains("placeholder.svg"));
    assert!(body.contains(&format!("/article/{id}")));

    let page = app
        .client
        .get(app.url(&format!("/article/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    let body = page.text().await.unwrap();
    assert!(body.contains("<h2>Section</h2>"));
    assert!(body.contains("<strong>bold</strong>"));
    assert!(!body.contains("<script>alert(1)</script>"));

    let missing = app.client.get(app.url("/article/999")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn simple_pages_render() {
    let app = spawn_app().await;
    app.db.create_task("Plan the roadmap", "Q3").await.unwrap();

    for (path, needle) in [
        ("/about", "Plan the roadmap"),
        ("/task_list", "Plan the roadmap"),
        ("/contact", "Contact"),
        ("/success", "Article saved"),
        ("/article-generator", "not configured"),
    ] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        let body = response.text().await.unwrap();
        assert!(body.contains(needle), "{path} should contain {needle}");
    }
}

#[tokio::test]
async fn unknown_route_renders_404_page() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/no/such/page")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("Page not found"));
}

// ============================================================================
// Article generator
// ============================================================================

#[tokio::test]
async fn generation_unavailable_without_api_key() {
    let app = spawn_app().await;
    let response = app
        .post_form("/generate-article", &[("prompt", "Anything")])
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn generate_and_accept_article() {
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "# Tide Pools\n\nLife between the tides is tough." } }]
        })))
        .mount(&openai)
        .await;

    let generator = ArticleGenerator::new(
        reqwest::Client::new(),
        SecretString::from("sk-test".to_string()),
        &openai.uri(),
        "gpt-3.5-turbo",
        0.7,
        "images/placeholder.svg",
    )
    .unwrap()
    .with_retry(0, Duration::from_millis(1));
    let app = spawn_app_with_generator(Some(generator)).await;

    let response = app
        .post_form("/generate-article", &[("prompt", "Write about tide pools")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Tide Pools"));
    assert!(body.contains("Life between the tides is tough."));

    let response = app
        .post_form(
            "/accept-article",
            &[
                ("title", "Tide Pools"),
                ("image_url", "images/placeholder.svg"),
                ("article_text", "Life between the tides is tough."),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/success");

    let articles = app.db.list_articles().await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Tide Pools");
    assert_eq!(articles[0].preview, "Life between the tides is tough.");
}

#[tokio::test]
async fn accept_article_requires_title() {
    let app = spawn_app().await;
    let response = app
        .post_form("/accept-article", &[("title", ""), ("article_text", "x")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.db.list_articles().await.unwrap().is_empty());
}

// ============================================================================
// Static files
// ============================================================================

#[tokio::test]
async fn static_files_with_etag() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/static/css/site.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/css; charset=utf-8");
    let etag = response.headers()["etag"].to_str().unwrap().to_string();

    let response = app
        .client
        .get(app.url("/static/css/site.css"))
        .header("if-none-match", &etag)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    let response = app
        .client
        .get(app.url("/static/css/missing.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.client.get(app.url("/favicon.ico")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/x-icon");
}
