//! HTTP surface tests.
//!
//! Drive the router in-process with mock database and generation clients.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use talktodb::config::Config;
use talktodb::db::{DatabaseClient, FailingDatabaseClient, MockDatabaseClient, Row};
use talktodb::llm::{FailingLlmClient, LlmClient, MockLlmClient, SqlGenerator};
use talktodb::query::QueryGate;
use talktodb::server::{router, AppState};

struct Harness {
    app: Router,
    db: Arc<MockDatabaseClient>,
    llm: Arc<MockLlmClient>,
}

fn harness_with(db: MockDatabaseClient) -> Harness {
    let db = Arc::new(db);
    let llm = Arc::new(MockLlmClient::new());
    let app = app(db.clone(), SqlGenerator::new(llm.clone(), "mock-model"));
    Harness { app, db, llm }
}

fn harness() -> Harness {
    harness_with(MockDatabaseClient::new())
}

fn app(db: Arc<dyn DatabaseClient>, generator: SqlGenerator) -> Router {
    router(AppState::new(
        Arc::new(Config::default()),
        QueryGate::new(db),
        generator,
    ))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn run_query(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/run-query", Some(body)).await
}

#[tokio::test]
async fn test_root_banner() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "TalkToDB backend is running!",
            "docs": "/docs",
            "using_model": "mock-model",
            "database": "talktodb"
        })
    );
}

#[tokio::test]
async fn test_banner_docs_link_resolves() {
    let h = harness();
    let (_, banner) = send(&h.app, Method::GET, "/", None).await;
    let docs_path = banner["docs"].as_str().unwrap();

    let (status, docs) = send(&h.app, Method::GET, docs_path, None).await;

    assert_eq!(status, StatusCode::OK);
    let paths: Vec<&str> = docs["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, ["/", "/health", "/generate-sql", "/run-query"]);
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_select_runs_regardless_of_confirm() {
    let h = harness_with(
        MockDatabaseClient::new()
            .with_rows(vec![Row::new().with("id", 1i64).with("name", "Alice")]),
    );

    for body in [
        json!({"sql": "SELECT id, name FROM users"}),
        json!({"sql": "SELECT id, name FROM users", "confirm": false}),
        json!({"sql": "select id, name from users", "confirm": true}),
    ] {
        let (status, response) = run_query(&h.app, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response,
            json!({
                "type": "SELECT",
                "rows_returned": 1,
                "data": [{"id": 1, "name": "Alice"}]
            })
        );
    }

    assert_eq!(h.db.executed_statements().len(), 3);
}

#[tokio::test]
async fn test_unconfirmed_update_needs_confirmation() {
    let h = harness();
    let (status, body) = run_query(
        &h.app,
        json!({"sql": "UPDATE users SET name='x' WHERE id=1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["needs_confirmation"], json!(true));
    assert_eq!(body["query_type"], json!("UPDATE"));
    assert!(body["message"].as_str().unwrap().contains("UPDATE"));
    assert!(body.get("data").is_none());
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_confirmed_update_executes() {
    let h = harness_with(MockDatabaseClient::new().with_affected_rows(1));
    let (status, body) = run_query(
        &h.app,
        json!({"sql": "UPDATE users SET name='x' WHERE id=1", "confirm": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "type": "UPDATE",
            "affected_rows": 1,
            "message": "UPDATE executed successfully. 1 row(s) affected."
        })
    );
    assert_eq!(
        h.db.executed_statements(),
        vec!["UPDATE users SET name='x' WHERE id=1".to_string()]
    );
}

#[tokio::test]
async fn test_confirm_round_trip_is_stateless() {
    let h = harness_with(MockDatabaseClient::new().with_affected_rows(5));
    let sql = "DELETE FROM transactions WHERE status = 'void'";

    let (_, pending) = run_query(&h.app, json!({"sql": sql})).await;
    assert_eq!(pending["needs_confirmation"], json!(true));

    let (status, done) = run_query(&h.app, json!({"sql": sql, "confirm": true})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["affected_rows"], json!(5));
    assert_eq!(h.db.executed_statements().len(), 1);
}

#[tokio::test]
async fn test_empty_sql_is_rejected_without_database() {
    let h = harness();

    for body in [json!({"sql": ""}), json!({"sql": "   "}), json!({})] {
        let (status, response) = run_query(&h.app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"detail": "SQL is required"}));
    }
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_dangerous_keywords_are_forbidden() {
    let h = harness();

    for sql in [
        "DROP TABLE users",
        "drop table users",
        "SELECT * FROM users; TRUNCATE transactions",
        "ALTER TABLE users ADD age INT",
        "SELECT 'create' AS word",
    ] {
        let (status, body) = run_query(&h.app, json!({"sql": sql, "confirm": true})).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{sql}");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Dangerous query blocked"));
    }
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_unsupported_statement() {
    let h = harness();
    let (status, body) = run_query(&h.app, json!({"sql": "SHOW TABLES", "confirm": true})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Unsupported"));
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_database_error_is_bad_request() {
    let failing: Arc<dyn DatabaseClient> = Arc::new(FailingDatabaseClient::new(
        "MySQL error: 1146 (42S02): Table 'talktodb.nope' doesn't exist",
    ));
    let app = app(failing, SqlGenerator::degraded("mock-model"));

    let (status, body) = run_query(&app, json!({"sql": "SELECT * FROM nope"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"detail": "MySQL error: 1146 (42S02): Table 'talktodb.nope' doesn't exist"})
    );
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let h = harness();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/run-query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_generate_sql() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/generate-sql",
        Some(json!({"prompt": "  show me all users  "})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"generated_sql": "SELECT * FROM users;"}));
    assert_eq!(h.llm.call_count(), 1);
    assert!(h.db.executed_statements().is_empty());
}

#[tokio::test]
async fn test_empty_prompt_skips_backend() {
    let h = harness();

    for body in [json!({"prompt": ""}), json!({"prompt": "   "}), json!({})] {
        let (status, response) =
            send(&h.app, Method::POST, "/generate-sql", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"detail": "Prompt is required"}));
    }
    assert_eq!(h.llm.call_count(), 0);
}

#[tokio::test]
async fn test_generate_sql_without_key_returns_placeholder() {
    let app = app(
        Arc::new(MockDatabaseClient::new()),
        SqlGenerator::degraded("models/gemini-2.5-flash"),
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/generate-sql",
        Some(json!({"prompt": "count users"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"generated_sql": "SELECT 1;"}));
}

#[tokio::test]
async fn test_generation_failure_is_bad_gateway() {
    let llm: Arc<dyn LlmClient> =
        Arc::new(FailingLlmClient::new("Gemini API error: API key not valid."));
    let app = app(
        Arc::new(MockDatabaseClient::new()),
        SqlGenerator::new(llm, "models/gemini-2.5-flash"),
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/generate-sql",
        Some(json!({"prompt": "count users"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"detail": "Gemini API error: API key not valid."}));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let h = harness();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/run-query")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
