//! # HTTP Contract Suite
//!
//! Sends one request per case to a live service and checks the response:
//! status first, then (when a schema is named and the body is non-empty)
//! the body against the OpenAPI contract.
//!
//! A failing case produces a failed [`ContractResult`]; nothing is raised
//! and later cases still run.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use synapse_schema::{OpenApiValidator, SpecError, ValidationError};
use thiserror::Error;
use url::Url;

use crate::summary::{Outcome, ResultLog, Summary};

fn default_method() -> String {
    "GET".to_string()
}

/// One HTTP case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpCase {
    #[serde(default = "default_method")]
    pub method: String,
    /// Path appended to the base URL, e.g. `/health`.
    pub path: String,
    /// JSON request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub expected_status: u16,
    /// Response schema; `None` checks the status only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl HttpCase {
    /// `GET path` expecting `expected_status`.
    pub fn get(path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            method: default_method(),
            path: path.into(),
            body: None,
            expected_status,
            schema: None,
        }
    }

    /// Set the request method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the JSON request body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Validate the response body against `schema`.
    pub fn expecting(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Why an HTTP case failed.
#[derive(Error, Debug)]
pub enum CaseFailure {
    #[error("creating request: {0}")]
    Request(String),

    #[error("executing request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("expected status {expected}, got {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    #[error("schema validation: {0}")]
    Schema(#[from] ValidationError),
}

/// Outcome of one HTTP case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractResult {
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub passed: bool,
    /// Response status, when a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    /// Response body, lossily decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl Outcome for ContractResult {
    fn passed(&self) -> bool {
        self.passed
    }
}

struct Exchange {
    status: u16,
    body: Vec<u8>,
}

/// Runs HTTP cases against one OpenAPI contract.
#[derive(Debug)]
pub struct ContractTestSuite {
    validator: Arc<OpenApiValidator>,
    results: ResultLog<ContractResult>,
}

impl ContractTestSuite {
    pub fn new(validator: Arc<OpenApiValidator>) -> Self {
        Self {
            validator,
            results: ResultLog::new(),
        }
    }

    /// Load the contract rooted at `spec_path` and wrap it.
    pub fn from_spec(spec_path: impl Into<PathBuf>) -> Result<Self, SpecError> {
        Ok(Self::new(Arc::new(OpenApiValidator::from_spec(spec_path)?)))
    }

    pub fn validator(&self) -> &Arc<OpenApiValidator> {
        &self.validator
    }

    /// Send the case to `base_url` and record the outcome.
    pub async fn run_http_test(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        case: HttpCase,
    ) -> ContractResult {
        let mut result = ContractResult {
            endpoint: case.path.clone(),
            method: case.method.clone(),
            schema: case.schema.clone(),
            passed: false,
            status: None,
            error: None,
            request_body: case.body.as_ref().map(Value::to_string),
            response: None,
        };

        let outcome = match self.send(client, base_url, &case).await {
            Ok(exchange) => {
                result.status = Some(exchange.status);
                result.response = Some(String::from_utf8_lossy(&exchange.body).into_owned());
                self.verify(&case, &exchange)
            }
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(()) => {
                result.passed = true;
                tracing::debug!(method = %case.method, path = %case.path, "response conforms");
            }
            Err(failure) => {
                tracing::warn!(
                    method = %case.method,
                    path = %case.path,
                    error = %failure,
                    "contract case failed"
                );
                result.error = Some(failure.to_string());
            }
        }

        self.results.push(result.clone());
        result
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        case: &HttpCase,
    ) -> Result<Exchange, CaseFailure> {
        let method = Method::from_bytes(case.method.as_bytes())
            .map_err(|e| CaseFailure::Request(format!("invalid method '{}': {e}", case.method)))?;
        let target = format!("{}{}", base_url.trim_end_matches('/'), case.path);
        let url = Url::parse(&target)
            .map_err(|e| CaseFailure::Request(format!("invalid URL '{target}': {e}")))?;

        let mut request = client.request(method, url).header(CONTENT_TYPE, "application/json");
        if let Some(body) = &case.body {
            let bytes = serde_json::to_vec(body).map_err(|e| CaseFailure::Request(e.to_string()))?;
            request = request.body(bytes);
        }

        let response = request.send().await.map_err(CaseFailure::Transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(CaseFailure::Transport)?;
        Ok(Exchange {
            status,
            body: body.to_vec(),
        })
    }

    fn verify(&self, case: &HttpCase, exchange: &Exchange) -> Result<(), CaseFailure> {
        if exchange.status != case.expected_status {
            return Err(CaseFailure::StatusMismatch {
                expected: case.expected_status,
                actual: exchange.status,
            });
        }
        match &case.schema {
            Some(schema) if !exchange.body.is_empty() => {
                self.validator.validate_response(schema, &exchange.body)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Every result recorded so far, in order.
    pub fn results(&self) -> Vec<ContractResult> {
        self.results.snapshot()
    }

    pub fn summary(&self) -> Summary {
        self.results.summary()
    }
}
