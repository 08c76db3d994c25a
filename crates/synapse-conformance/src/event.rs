//! # Event Contract Suite
//!
//! Validates event payloads against the AsyncAPI contract, one call per
//! observed message, and keeps every outcome for the final summary.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use synapse_schema::{AsyncApiValidator, FailureKind, SpecError};

use crate::summary::{Outcome, ResultLog, Summary};

/// One event case, as read from a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCase {
    /// Channel the payload was observed on.
    pub channel: String,
    /// Schema to validate against.
    pub schema: String,
    /// Message payload.
    pub payload: Value,
}

/// Outcome of one event validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventResult {
    pub channel: String,
    pub schema: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The payload as received, lossily decoded.
    pub payload: String,
}

impl Outcome for EventResult {
    fn passed(&self) -> bool {
        self.passed
    }
}

/// Runs event cases against one AsyncAPI contract.
#[derive(Debug)]
pub struct EventContractTestSuite {
    validator: Arc<AsyncApiValidator>,
    results: ResultLog<EventResult>,
}

impl EventContractTestSuite {
    pub fn new(validator: Arc<AsyncApiValidator>) -> Self {
        Self {
            validator,
            results: ResultLog::new(),
        }
    }

    /// Load the contract at `spec_path` and wrap it.
    pub fn from_spec(spec_path: impl Into<PathBuf>) -> Result<Self, SpecError> {
        Ok(Self::new(Arc::new(AsyncApiValidator::from_spec(spec_path)?)))
    }

    /// The underlying validator.
    pub fn validator(&self) -> &Arc<AsyncApiValidator> {
        &self.validator
    }

    /// Validate `payload` against `schema` and record the outcome.
    ///
    /// Failures are recorded and returned, never raised; the suite keeps
    /// going after a failed case.
    pub fn validate_event(&self, channel: &str, schema: &str, payload: &[u8]) -> EventResult {
        let checked = self.validator.check_event(channel, schema, payload);
        let result = EventResult {
            channel: channel.to_string(),
            schema: schema.to_string(),
            passed: checked.passed,
            failure: checked.failure,
            error: checked.diagnostic,
            payload: String::from_utf8_lossy(payload).into_owned(),
        };

        if result.passed {
            tracing::debug!(channel, schema, "event conforms");
        } else {
            tracing::warn!(channel, schema, error = ?result.error, "event violates contract");
        }

        self.results.push(result.clone());
        result
    }

    /// Serialise the case payload and validate it.
    pub fn run_case(&self, case: &EventCase) -> EventResult {
        let payload = case.payload.to_string();
        self.validate_event(&case.channel, &case.schema, payload.as_bytes())
    }

    /// Every result recorded so far, in order.
    pub fn results(&self) -> Vec<EventResult> {
        self.results.snapshot()
    }

    pub fn summary(&self) -> Summary {
        self.results.summary()
    }
}
