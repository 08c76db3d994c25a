//! # synapse-cli — Contract Tooling
//!
//! Provides the `synapse-contract` command-line interface.
//!
//! ## Subcommands
//!
//! - `synapse-contract inspect`: list schemas, channels and operations.
//! - `synapse-contract validate`: validate payload files against a schema.
//! - `synapse-contract events`: run a manifest of event cases.
//! - `synapse-contract probe`: run HTTP cases against a live service.
//!
//! ```bash
//! synapse-contract inspect --asyncapi contracts/asyncapi/asyncapi.yaml
//! synapse-contract validate --openapi contracts/openapi/openapi.yaml --schema Order order.json
//! synapse-contract probe --base-url http://localhost:8080 --cases contracts/cases/http.yaml
//! ```
//!
//! ## Exit Codes
//!
//! `0` when every case passed, `1` when any case failed, `2` when the run
//! itself could not proceed (unreadable contract, bad configuration).

pub mod config;
pub mod events;
pub mod inspect;
pub mod probe;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use synapse_conformance::Summary;
use synapse_schema::{AsyncApiLoader, AsyncApiValidator, ContractValidator, OpenApiLoader, OpenApiValidator};

use crate::config::CliConfig;

/// Every case passed.
pub const EXIT_OK: u8 = 0;
/// At least one case failed.
pub const EXIT_FAILURES: u8 = 1;
/// The run could not proceed.
pub const EXIT_ERROR: u8 = 2;

/// Exit code for a finished run.
pub fn exit_code(summary: &Summary) -> u8 {
    if summary.all_passed() {
        EXIT_OK
    } else {
        EXIT_FAILURES
    }
}

/// Which contract to load. Falls back to the configured spec when neither
/// flag is given.
#[derive(Args, Debug, Clone, Default)]
pub struct ContractArgs {
    /// Root OpenAPI document.
    #[arg(long, value_name = "PATH", conflicts_with = "asyncapi")]
    pub openapi: Option<PathBuf>,

    /// AsyncAPI document.
    #[arg(long, value_name = "PATH")]
    pub asyncapi: Option<PathBuf>,
}

/// A loaded contract of either dialect.
#[derive(Debug)]
pub enum Contract {
    Rest(OpenApiValidator),
    Event(AsyncApiValidator),
}

impl Contract {
    /// The dialect-independent facade.
    pub fn validator(&self) -> &ContractValidator {
        match self {
            Contract::Rest(v) => v.contract(),
            Contract::Event(v) => v.contract(),
        }
    }

    pub fn spec_path(&self) -> &Path {
        match self {
            Contract::Rest(v) => v.spec_path(),
            Contract::Event(v) => v.spec_path(),
        }
    }
}

impl ContractArgs {
    /// Load the selected contract with the configured engine options.
    pub fn load(&self, config: &CliConfig) -> Result<Contract> {
        let options = config.engine_options();
        let (openapi, asyncapi) = match (&self.openapi, &self.asyncapi) {
            (None, None) => (config.openapi_spec.as_ref(), config.asyncapi_spec.as_ref()),
            (openapi, asyncapi) => (openapi.as_ref(), asyncapi.as_ref()),
        };

        match (openapi, asyncapi) {
            (Some(path), None) => OpenApiLoader::new(path)
                .with_options(options)
                .load()
                .map(Contract::Rest)
                .with_context(|| format!("failed to load OpenAPI contract {}", path.display())),
            (None, Some(path)) => AsyncApiLoader::new(path)
                .with_options(options)
                .load()
                .map(Contract::Event)
                .with_context(|| format!("failed to load AsyncAPI contract {}", path.display())),
            (Some(_), Some(_)) => {
                bail!("both an OpenAPI and an AsyncAPI spec are configured; pass --openapi or --asyncapi")
            }
            (None, None) => bail!("no contract given; pass --openapi or --asyncapi"),
        }
    }
}

/// JSON report written by `--report`.
#[derive(Debug, Serialize)]
pub struct Report<'a, T> {
    pub summary: Summary,
    pub results: &'a [T],
}

/// Write `results` and their summary as pretty JSON.
pub fn write_report<T: Serialize>(path: &Path, summary: Summary, results: &[T]) -> Result<()> {
    let report = Report { summary, results };
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}

/// Read a YAML list of cases.
pub fn read_cases<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cases {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("invalid case manifest {}", path.display()))
}

/// Print the closing summary line.
pub fn print_summary(summary: &Summary) {
    println!("\n{}/{} passed", summary.passed, summary.total());
    if summary.failed > 0 {
        println!("{} case(s) failed.", summary.failed);
    }
}
