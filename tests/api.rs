use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use failure::Error;
use repo_search::{Provider, Relay, RepositoryRecord, SqliteStore, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Always returns the same search results.
struct Fixed(Vec<RepositoryRecord>);

#[async_trait]
impl Provider for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, _keyword: &str) -> Result<Vec<RepositoryRecord>, Error> {
        Ok(self.0.clone())
    }
}

struct Down;

#[async_trait]
impl Provider for Down {
    fn name(&self) -> &str {
        "down"
    }

    async fn search(&self, _keyword: &str) -> Result<Vec<RepositoryRecord>, Error> {
        Err(failure::err_msg("connection reset by peer"))
    }
}

struct Unreadable;

#[async_trait]
impl Store for Unreadable {
    async fn delete_all(&self) -> Result<(), Error> {
        Err(failure::err_msg("database is locked"))
    }

    async fn insert_many(&self, _records: &[RepositoryRecord]) -> Result<(), Error> {
        Err(failure::err_msg("database is locked"))
    }

    async fn read(&self, _skip: u64, _limit: u64) -> Result<Vec<RepositoryRecord>, Error> {
        Err(failure::err_msg("database is locked"))
    }
}

fn app(provider: impl Provider + 'static, store: impl Store + 'static) -> Router {
    repo_search::server::router(Relay::new(Arc::new(provider), Arc::new(store)))
}

fn search_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn page_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&body).unwrap())
}

fn numbered(count: usize) -> Vec<RepositoryRecord> {
    (0..count)
        .map(|i| {
            RepositoryRecord::new(
                format!("repo-{}", i),
                Some("something"),
                i as u64,
                format!("https://github.com/someone/repo-{}", i),
            )
        })
        .collect()
}

#[tokio::test]
async fn search_then_read_it_back() {
    let record = RepositoryRecord::new("a", Some("d"), 5, "u1");
    let app = app(Fixed(vec![record]), SqliteStore::in_memory().unwrap());

    let (status, body) = send(&app, search_request(r#"{"keyword": "x"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let stored = json!([{ "name": "a", "description": "d", "stars": 5, "url": "u1" }]);
    assert_eq!(
        body,
        json!({ "message": "Repos fetched & stored", "repos": stored.clone() })
    );

    let (status, body) = send(&app, page_request("/api/repos")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, stored);
}

#[tokio::test]
async fn missing_keywords_are_bad_requests() {
    let app = app(Fixed(numbered(1)), SqliteStore::in_memory().unwrap());

    for body in &["{}", r#"{"keyword": ""}"#, r#"{"keyword": null}"#] {
        let (status, got) = send(&app, search_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(got, json!({ "error": "Keyword required" }));
    }

    let (_, stored) = send(&app, page_request("/api/repos")).await;
    assert_eq!(stored, json!([]));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app(Fixed(numbered(1)), SqliteStore::in_memory().unwrap());

    for body in &["not json", r#"{"keyword": 42}"#, r#"{"keyword": ["x"]}"#] {
        let (status, got) = send(&app, search_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(got, json!({ "error": "Invalid request body" }));
    }
}

#[tokio::test]
async fn upstream_failures_are_server_errors() {
    let app = app(Down, SqliteStore::in_memory().unwrap());

    let (status, got) = send(&app, search_request(r#"{"keyword": "x"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(got, json!({ "error": "Failed to fetch repos" }));
}

#[tokio::test]
async fn storage_failures_are_server_errors() {
    let app = app(Fixed(numbered(3)), Unreadable);

    let (status, got) = send(&app, search_request(r#"{"keyword": "x"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(got, json!({ "error": "Failed to fetch repos" }));

    let (status, got) = send(&app, page_request("/api/repos?page=2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(got, json!({ "error": "Failed to fetch repos from DB" }));
}

#[tokio::test]
async fn pages_hold_ten_records() {
    let app = app(Fixed(numbered(20)), SqliteStore::in_memory().unwrap());
    send(&app, search_request(r#"{"keyword": "x"}"#)).await;

    let (_, first) = send(&app, page_request("/api/repos?page=1")).await;
    let (_, second) = send(&app, page_request("/api/repos?page=2")).await;
    let (_, third) = send(&app, page_request("/api/repos?page=3")).await;

    assert_eq!(first, serde_json::to_value(&numbered(20)[..10]).unwrap());
    assert_eq!(second, serde_json::to_value(&numbered(20)[10..]).unwrap());
    assert_eq!(third, json!([]));
}

#[tokio::test]
async fn nonsense_pages_are_the_first_page() {
    let app = app(Fixed(numbered(12)), SqliteStore::in_memory().unwrap());
    send(&app, search_request(r#"{"keyword": "x"}"#)).await;

    let (_, first) = send(&app, page_request("/api/repos?page=1")).await;

    for uri in &["/api/repos", "/api/repos?page=abc", "/api/repos?page="] {
        let (status, got) = send(&app, page_request(uri)).await;

        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(got, first, "{}", uri);
    }
}

#[tokio::test]
async fn pages_past_the_end_are_empty() {
    let app = app(Fixed(numbered(12)), SqliteStore::in_memory().unwrap());
    send(&app, search_request(r#"{"keyword": "x"}"#)).await;

    for uri in &[
        "/api/repos?page=1000000000000000000",
        "/api/repos?page=99999999999999999999",
    ] {
        let (status, got) = send(&app, page_request(uri)).await;

        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(got, json!([]), "{}", uri);
    }
}

#[tokio::test]
async fn repeated_page_parameters_are_the_first_page() {
    let app = app(Fixed(numbered(12)), SqliteStore::in_memory().unwrap());
    send(&app, search_request(r#"{"keyword": "x"}"#)).await;

    let (_, first) = send(&app, page_request("/api/repos?page=1")).await;
    let (status, got) = send(&app, page_request("/api/repos?page=2&page=3")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(got, first);
}
