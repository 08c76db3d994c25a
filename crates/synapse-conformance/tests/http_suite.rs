//! Tests for ContractTestSuite::run_http_test().
//!
//! Serves the repository REST contract's endpoints from wiremock and checks
//! that status mismatches, transport errors and schema violations each come
//! back as distinct failed results.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use synapse_conformance::{ContractTestSuite, HttpCase, Summary};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn suite() -> ContractTestSuite {
    ContractTestSuite::from_spec(repo_root().join("contracts/openapi/openapi.yaml")).unwrap()
}

async fn mount_health(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": status,
            "components": { "postgres": { "status": "healthy" } }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn conforming_response_passes() {
    let server = MockServer::start().await;
    mount_health(&server, "healthy").await;

    let suite = suite();
    let result = suite
        .run_http_test(
            &reqwest::Client::new(),
            &server.uri(),
            HttpCase::get("/health", 200).expecting("HealthResponse"),
        )
        .await;

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.status, Some(200));
    assert!(result.response.unwrap().contains("postgres"));
}

#[tokio::test]
async fn schema_violation_fails_with_schema_message() {
    let server = MockServer::start().await;
    mount_health(&server, "on-fire").await;

    let result = suite()
        .run_http_test(
            &reqwest::Client::new(),
            &server.uri(),
            HttpCase::get("/health", 200).expecting("HealthResponse"),
        )
        .await;

    assert!(!result.passed);
    let error = result.error.unwrap();
    assert!(error.starts_with("schema validation: "), "{error}");
    assert!(error.contains("/status"), "{error}");
}

#[tokio::test]
async fn status_mismatch_skips_schema_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let result = suite()
        .run_http_test(
            &reqwest::Client::new(),
            &server.uri(),
            HttpCase::get("/api/v1/orders", 200).expecting("OrderList"),
        )
        .await;

    assert_eq!(result.error.as_deref(), Some("expected status 200, got 503"));
    assert_eq!(result.response.as_deref(), Some("unavailable"));
}

#[tokio::test]
async fn empty_body_or_missing_schema_checks_status_only() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/orders/42"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let suite = suite();
    let client = reqwest::Client::new();
    let deleted = suite
        .run_http_test(
            &client,
            &server.uri(),
            HttpCase::get("/api/v1/orders/42", 204)
                .with_method("DELETE")
                .expecting("Order"),
        )
        .await;
    assert!(deleted.passed, "{:?}", deleted.error);

    let live = suite
        .run_http_test(&client, &server.uri(), HttpCase::get("/health/live", 200))
        .await;
    assert!(live.passed, "{:?}", live.error);
}

#[tokio::test]
async fn request_body_is_sent_as_json() {
    let server = MockServer::start().await;
    let order = json!({ "customerId": "cust-1", "items": [{ "sku": "A", "quantity": 1, "unitPrice": 2.5 }] });
    Mock::given(method("POST"))
        .and(path("/api/v1/orders"))
        .and(header("content-type", "application/json"))
        .and(body_json(&order))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "type": "about:blank",
            "title": "Accepted",
            "status": 202
        })))
        .mount(&server)
        .await;

    let result = suite()
        .run_http_test(
            &reqwest::Client::new(),
            &server.uri(),
            HttpCase::get("/api/v1/orders", 202)
                .with_method("POST")
                .with_body(order.clone())
                .expecting("Problem"),
        )
        .await;

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.request_body, Some(order.to_string()));
}

#[tokio::test]
async fn transport_and_request_errors_are_distinct() {
    let suite = suite();
    let client = reqwest::Client::new();

    // Closed port: unreachable.
    let unreachable = suite
        .run_http_test(&client, "http://127.0.0.1:1", HttpCase::get("/health", 200))
        .await;
    assert!(unreachable.error.unwrap().starts_with("executing request: "));
    assert!(unreachable.status.is_none());

    let bad_method = suite
        .run_http_test(
            &client,
            "http://127.0.0.1:1",
            HttpCase::get("/health", 200).with_method("NOT A METHOD"),
        )
        .await;
    assert!(bad_method.error.unwrap().starts_with("creating request: "));

    let bad_url = suite
        .run_http_test(&client, "not a url", HttpCase::get("/health", 200))
        .await;
    assert!(bad_url.error.unwrap().starts_with("creating request: "));

    assert_eq!(suite.summary(), Summary { passed: 0, failed: 3 });
}

#[tokio::test]
async fn concurrent_cases_are_all_recorded() {
    let server = MockServer::start().await;
    mount_health(&server, "healthy").await;

    let suite = Arc::new(suite());
    let client = reqwest::Client::new();
    let uri = server.uri();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let suite = Arc::clone(&suite);
            let client = client.clone();
            let uri = uri.clone();
            tokio::spawn(async move {
                let expected = if i % 2 == 0 { 200 } else { 201 };
                suite
                    .run_http_test(&client, &uri, HttpCase::get("/health", expected).expecting("HealthResponse"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let summary = suite.summary();
    assert_eq!(summary, Summary { passed: 5, failed: 5 });
    assert_eq!(suite.results().len(), 10);
}
