//! # synapse-conformance — Contract Test Suites
//!
//! Drives runtime payloads through a compiled contract and keeps score:
//!
//! - [`ContractTestSuite`]: sends HTTP cases to a running service and
//!   validates each response body against the OpenAPI contract.
//! - [`EventContractTestSuite`]: validates event payloads against the
//!   AsyncAPI contract.
//!
//! Both suites share one immutable validator behind an `Arc` and append
//! results under a lock, so cases may run concurrently. A failed case is a
//! recorded result, never an early exit.

pub mod event;
pub mod http;
pub mod summary;

pub use event::{EventCase, EventContractTestSuite, EventResult};
pub use http::{CaseFailure, ContractResult, ContractTestSuite, HttpCase};
pub use summary::{Outcome, Summary};
