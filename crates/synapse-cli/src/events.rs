//! # Events Subcommand
//!
//! Runs a YAML manifest of event cases through the event suite:
//!
//! ```yaml
//! - channel: orders/ingest
//!   schema: OrderReceivedPayload
//!   payload: { orderId: o-1, ... }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use synapse_conformance::{EventCase, EventContractTestSuite};

use crate::config::CliConfig;
use crate::{exit_code, print_summary, read_cases, write_report, Contract, ContractArgs};

/// Arguments for the `synapse-contract events` subcommand.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// AsyncAPI document. Defaults to the configured spec.
    #[arg(long, value_name = "PATH")]
    pub asyncapi: Option<PathBuf>,

    /// YAML manifest of event cases.
    #[arg(long, value_name = "FILE")]
    pub cases: PathBuf,

    /// Write JSON results here.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// Execute the events subcommand.
pub fn run_events(args: &EventsArgs, config: &CliConfig) -> Result<u8> {
    let selection = ContractArgs {
        openapi: None,
        asyncapi: args.asyncapi.clone().or_else(|| config.asyncapi_spec.clone()),
    };
    let Contract::Event(validator) = selection.load(config)? else {
        bail!("events needs an AsyncAPI contract");
    };

    let cases: Vec<EventCase> = read_cases(&args.cases)?;
    tracing::info!(count = cases.len(), "running event cases");

    let suite = EventContractTestSuite::new(Arc::new(validator));
    for case in &cases {
        let result = suite.run_case(case);
        if result.passed {
            println!("  PASS: {} {}", case.channel, case.schema);
        } else {
            println!(
                "  FAIL: {} {} — {}",
                case.channel,
                case.schema,
                result.error.as_deref().unwrap_or("failed")
            );
        }
    }

    let summary = suite.summary();
    print_summary(&summary);
    if let Some(path) = &args.report {
        write_report(path, summary, &suite.results())?;
    }
    Ok(exit_code(&summary))
}
