//! # Validate Subcommand
//!
//! Validates payload files against one named schema. Every file is checked
//! even after a failure; the exit code reflects the whole batch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use synapse_conformance::{Outcome, Summary};
use synapse_schema::ValidationResult;

use crate::config::CliConfig;
use crate::{exit_code, print_summary, ContractArgs};

/// Arguments for the `synapse-contract validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Schema to validate against.
    #[arg(long)]
    pub schema: String,

    /// Channel the payloads were observed on (reporting only).
    #[arg(long)]
    pub channel: Option<String>,

    /// JSON payload files.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// One checked file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub file: PathBuf,
    pub result: ValidationResult,
}

impl Outcome for FileResult {
    fn passed(&self) -> bool {
        self.result.passed
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig) -> Result<u8> {
    let contract = args.contract.load(config)?;
    let validator = contract.validator();

    let mut results = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let payload = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
        let result = match &args.channel {
            Some(channel) => validator.check_event(channel, &args.schema, &payload),
            None => validator.check(&args.schema, &payload),
        };

        if result.passed {
            println!("  PASS: {}", file.display());
        } else {
            println!(
                "  FAIL: {} — {}",
                file.display(),
                result.diagnostic.as_deref().unwrap_or("failed")
            );
        }
        results.push(FileResult {
            file: file.clone(),
            result,
        });
    }

    let summary = Summary::of(&results);
    print_summary(&summary);
    Ok(exit_code(&summary))
}
