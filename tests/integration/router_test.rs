//! HTTP contract tests.
//!
//! Drives the router in-process with a mock connector.

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};
use sql_gateway::db::{MockConnector, Outcome, Row, ScriptedResult, Value};
use sql_gateway::error::GatewayError;
use sql_gateway::gateway::QueryGateway;
use sql_gateway::server::GatewayServer;
use tower::ServiceExt;

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Json {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

fn router_for(connector: &MockConnector) -> Router {
    GatewayServer::build_router(QueryGateway::new(connector.clone()))
}

async fn send(router: &Router, method: Method, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri).await
}

fn assert_cors_headers(response: &TestResponse) {
    let header = |name: &str| {
        response
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    assert_eq!(
        header("access-control-allow-origin").as_deref(),
        Some("*")
    );
    assert_eq!(
        header("access-control-allow-headers").as_deref(),
        Some("Content-Type")
    );
    assert_eq!(
        header("access-control-allow-methods").as_deref(),
        Some("GET, POST, OPTIONS")
    );
}

fn scripted_select() -> MockConnector {
    let rows = vec![Row::from_iter([("x", Value::Int(1))])];
    MockConnector::new().with_result("SELECT 1 AS x", ScriptedResult::Ok(Outcome::RowSet(rows)))
}

#[tokio::test]
async fn test_missing_query_is_client_error() {
    let connector = MockConnector::new();
    let router = router_for(&connector);

    let response = get(&router, "/query").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({"error": "No SQL query provided"}));
    assert_cors_headers(&response);
    assert_eq!(connector.opened_connections(), 0);
}

#[tokio::test]
async fn test_empty_query_is_client_error() {
    let connector = MockConnector::new();
    let router = router_for(&connector);

    let response = get(&router, "/query?q=").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({"error": "No SQL query provided"}));
    assert_eq!(connector.opened_connections(), 0);
}

#[tokio::test]
async fn test_select_returns_row_objects() {
    let connector = scripted_select();
    let router = router_for(&connector);

    let response = get(&router, "/query?q=SELECT%201%20AS%20x").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([{"x": 1}]));
    assert_eq!(
        response
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_plus_encoded_spaces_are_decoded() {
    let connector = scripted_select();
    let router = router_for(&connector);

    let response = get(&router, "/query?q=SELECT+1+AS+x").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([{"x": 1}]));
}

#[tokio::test]
async fn test_first_q_parameter_wins() {
    let connector = scripted_select();
    let router = router_for(&connector);

    let response = get(&router, "/query?q=SELECT%201%20AS%20x&q=DROP%20TABLE%20t").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([{"x": 1}]));
}

#[tokio::test]
async fn test_mutation_returns_affected_rows() {
    let connector = MockConnector::new().with_result(
        "UPDATE t SET c=1 WHERE id=1",
        ScriptedResult::Ok(Outcome::mutation(1)),
    );
    let router = router_for(&connector);

    let response = get(&router, "/query?q=UPDATE%20t%20SET%20c%3D1%20WHERE%20id%3D1").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"affected_rows": 1}));
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_database_error_carries_code_and_sqlstate() {
    let connector = MockConnector::new().with_result(
        "SELEC 1",
        ScriptedResult::Err(GatewayError::database(
            "You have an error in your SQL syntax",
            1064,
            "42000",
        )),
    );
    let router = router_for(&connector);

    let response = get(&router, "/query?q=SELEC%201").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({
            "error": "You have an error in your SQL syntax",
            "code": 1064,
            "sqlstate": "42000"
        })
    );
    assert_cors_headers(&response);
    assert_eq!(connector.open_connections(), 0);
}

#[tokio::test]
async fn test_configuration_error_has_message_only() {
    let connector = MockConnector::failing(GatewayError::config(
        "Database password not set. Export the DB_PASSWORD environment variable.",
    ));
    let router = router_for(&connector);

    let response = get(&router, "/query?q=SELECT%201").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({"error": "Database password not set. Export the DB_PASSWORD environment variable."})
    );
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_connections_return_to_baseline() {
    let connector = scripted_select().with_result(
        "SELEC 1",
        ScriptedResult::Err(GatewayError::database("syntax", 1064, "42000")),
    );
    let router = router_for(&connector);

    for uri in [
        "/query?q=SELECT%201%20AS%20x",
        "/query?q=SELEC%201",
        "/query?q=DELETE%20FROM%20t",
        "/query",
    ] {
        get(&router, uri).await;
        assert_eq!(connector.open_connections(), 0, "leaked connection for {uri}");
    }

    assert_eq!(connector.opened_connections(), 3);
}

#[tokio::test]
async fn test_repeated_read_is_identical() {
    let connector = scripted_select();
    let router = router_for(&connector);

    let first = get(&router, "/query?q=SELECT%201%20AS%20x").await;
    let second = get(&router, "/query?q=SELECT%201%20AS%20x").await;

    assert_eq!(first.body, second.body);
    assert_eq!(connector.opened_connections(), 2);
}

#[tokio::test]
async fn test_preflight_carries_cors_headers() {
    let connector = MockConnector::new();
    let router = router_for(&connector);

    let response = send(&router, Method::OPTIONS, "/query").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
    assert_cors_headers(&response);
    assert_eq!(connector.opened_connections(), 0);
}

#[tokio::test]
async fn test_unsupported_method_carries_cors_headers() {
    let connector = MockConnector::new();
    let router = router_for(&connector);

    let response = send(&router, Method::POST, "/query?q=SELECT%201").await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_cors_headers(&response);
    assert_eq!(connector.opened_connections(), 0);
}

#[tokio::test]
async fn test_unknown_path_carries_cors_headers() {
    let connector = MockConnector::new();
    let router = router_for(&connector);

    let response = get(&router, "/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_cors_headers(&response);
}
