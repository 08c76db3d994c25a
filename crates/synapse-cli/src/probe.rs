//! # Probe Subcommand
//!
//! Runs HTTP cases against a live service and validates each response
//! against the OpenAPI contract. Cases run in manifest order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use synapse_conformance::{ContractResult, ContractTestSuite, HttpCase, Summary};

use crate::config::CliConfig;
use crate::{exit_code, print_summary, read_cases, write_report, Contract, ContractArgs};

/// Arguments for the `synapse-contract probe` subcommand.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Root OpenAPI document. Defaults to the configured spec.
    #[arg(long, value_name = "PATH")]
    pub openapi: Option<PathBuf>,

    /// Base URL of the service under test. Defaults to the configured URL.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// YAML manifest of HTTP cases.
    #[arg(long, value_name = "FILE")]
    pub cases: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write JSON results here.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// Execute the probe subcommand.
pub fn run_probe(args: &ProbeArgs, config: &CliConfig) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(probe(args, config))
}

/// Async body of [`run_probe`], for callers that already run a runtime.
pub async fn probe(args: &ProbeArgs, config: &CliConfig) -> Result<u8> {
    let Some(base_url) = args.base_url.clone().or_else(|| config.base_url.clone()) else {
        bail!("no base URL given; pass --base-url or set SYNAPSE_BASE_URL");
    };

    let selection = ContractArgs {
        openapi: args.openapi.clone().or_else(|| config.openapi_spec.clone()),
        asyncapi: None,
    };
    let Contract::Rest(validator) = selection.load(config)? else {
        bail!("probe needs an OpenAPI contract");
    };

    let cases: Vec<HttpCase> = read_cases(&args.cases)?;
    let timeout = args
        .timeout_secs
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.http_timeout());
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    tracing::info!(count = cases.len(), base_url = %base_url, "running HTTP cases");

    let suite = ContractTestSuite::new(Arc::new(validator));
    for case in cases {
        let result = suite.run_http_test(&client, &base_url, case).await;
        print_result(&result);
    }

    let summary: Summary = suite.summary();
    print_summary(&summary);
    if let Some(path) = &args.report {
        write_report(path, summary, &suite.results())?;
    }
    Ok(exit_code(&summary))
}

fn print_result(result: &ContractResult) {
    let schema = result.schema.as_deref().unwrap_or("-");
    if result.passed {
        println!("  PASS: {} {} ({schema})", result.method, result.endpoint);
    } else {
        println!(
            "  FAIL: {} {} ({schema}) — {}",
            result.method,
            result.endpoint,
            result.error.as_deref().unwrap_or("failed")
        );
    }
}
