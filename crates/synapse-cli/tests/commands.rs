//! Subcommand handlers run against the repository contracts.

use std::path::PathBuf;

use serde_json::{json, Value};
use synapse_cli::config::CliConfig;
use synapse_cli::events::{run_events, EventsArgs};
use synapse_cli::inspect::{run_inspect, Inventory, InspectArgs};
use synapse_cli::probe::{probe, ProbeArgs};
use synapse_cli::validate::{run_validate, ValidateArgs};
use synapse_cli::{ContractArgs, EXIT_FAILURES, EXIT_OK};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn openapi_spec() -> PathBuf {
    repo_root().join("contracts/openapi/openapi.yaml")
}

fn asyncapi_spec() -> PathBuf {
    repo_root().join("contracts/asyncapi/asyncapi.yaml")
}

fn rest() -> ContractArgs {
    ContractArgs {
        openapi: Some(openapi_spec()),
        asyncapi: None,
    }
}

#[test]
fn validate_reports_failures_in_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    std::fs::write(&good, r#"{"type": "about:blank", "title": "Not Found", "status": 404}"#).unwrap();
    std::fs::write(&bad, r#"{"type": "about:blank", "title": "Not Found", "status": 42}"#).unwrap();

    let config = CliConfig::default();
    let only_good = ValidateArgs {
        contract: rest(),
        schema: "Problem".into(),
        channel: None,
        files: vec![good.clone()],
    };
    assert_eq!(run_validate(&only_good, &config).unwrap(), EXIT_OK);

    let mixed = ValidateArgs {
        files: vec![good, bad],
        ..only_good
    };
    assert_eq!(run_validate(&mixed, &config).unwrap(), EXIT_FAILURES);
}

#[test]
fn validate_missing_file_is_an_error() {
    let args = ValidateArgs {
        contract: rest(),
        schema: "Problem".into(),
        channel: None,
        files: vec![PathBuf::from("/nonexistent/payload.json")],
    };
    assert!(run_validate(&args, &CliConfig::default()).is_err());
}

#[test]
fn contract_falls_back_to_config() {
    let config = CliConfig {
        asyncapi_spec: Some(asyncapi_spec()),
        ..CliConfig::default()
    };
    let contract = ContractArgs::default().load(&config).unwrap();
    let inventory = Inventory::of(&contract);
    assert_eq!(inventory.dialect, "asyncapi");
    assert_eq!(inventory.channels.len(), 3);
    assert!(inventory.schemas.iter().any(|s| s.name == "StageCompletePayload"
        && s.resource == "synapse://asyncapi/StageCompletePayload"));

    let ambiguous = CliConfig {
        openapi_spec: Some(openapi_spec()),
        ..config
    };
    assert!(ContractArgs::default().load(&ambiguous).is_err());
    assert!(ContractArgs::default().load(&CliConfig::default()).is_err());
}

#[test]
fn inspect_succeeds_for_both_dialects() {
    let config = CliConfig::default();
    for contract in [
        rest(),
        ContractArgs {
            openapi: None,
            asyncapi: Some(asyncapi_spec()),
        },
    ] {
        let args = InspectArgs { contract, json: true };
        assert_eq!(run_inspect(&args, &config).unwrap(), EXIT_OK);
    }
}

#[test]
fn events_runs_shipped_manifest_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("events.json");
    let args = EventsArgs {
        asyncapi: Some(asyncapi_spec()),
        cases: repo_root().join("contracts/cases/events.yaml"),
        report: Some(report.clone()),
    };
    assert_eq!(run_events(&args, &CliConfig::default()).unwrap(), EXIT_OK);

    let written: Value = serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(written["summary"], json!({ "passed": 3, "failed": 0 }));
    assert_eq!(written["results"].as_array().unwrap().len(), 3);
}

#[test]
fn events_rejects_rest_contract() {
    let config = CliConfig {
        openapi_spec: Some(openapi_spec()),
        ..CliConfig::default()
    };
    let args = EventsArgs {
        asyncapi: None,
        cases: repo_root().join("contracts/cases/events.yaml"),
        report: None,
    };
    assert!(run_events(&args, &config).is_err());
}

#[tokio::test]
async fn probe_runs_http_cases_against_live_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "components": { "redis": { "status": "healthy" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pipeline/stages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stages": [
                { "id": "validate", "name": "Validate", "order": 1 },
                { "id": "enrich", "name": "Enrich", "order": 2 },
                { "id": "route", "name": "Route", "order": 3 }
            ]
        })))
        .mount(&server)
        .await;
    // Orders omit the required customerId: one contract failure.
    Mock::given(method("GET"))
        .and(path("/api/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [{
                "orderId": "550e8400-e29b-41d4-a716-446655440000",
                "items": [{ "sku": "A", "quantity": 1, "unitPrice": 1.0 }],
                "totalAmount": 1.0,
                "currency": "USD",
                "status": "received"
            }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("probe.json");
    let config = CliConfig {
        openapi_spec: Some(openapi_spec()),
        base_url: Some(server.uri()),
        ..CliConfig::default()
    };
    let args = ProbeArgs {
        openapi: None,
        base_url: None,
        cases: repo_root().join("contracts/cases/http.yaml"),
        timeout_secs: Some(5),
        report: Some(report.clone()),
    };

    assert_eq!(probe(&args, &config).await.unwrap(), EXIT_FAILURES);

    let written: Value = serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(written["summary"], json!({ "passed": 3, "failed": 1 }));
    let failed: Vec<&Value> = written["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["passed"] == json!(false))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["endpoint"], "/api/v1/orders");
    assert!(failed[0]["error"].as_str().unwrap().contains("customerId"));
}

#[tokio::test]
async fn probe_without_base_url_is_an_error() {
    let args = ProbeArgs {
        openapi: Some(openapi_spec()),
        base_url: None,
        cases: repo_root().join("contracts/cases/http.yaml"),
        timeout_secs: None,
        report: None,
    };
    assert!(probe(&args, &CliConfig::default()).await.is_err());
}
