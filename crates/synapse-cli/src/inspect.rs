//! # Inspect Subcommand
//!
//! Prints what a contract declares: compiled schemas for both dialects,
//! plus channels and operations for AsyncAPI.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use synapse_schema::{ChannelInfo, OperationInfo, SpecInfo};

use crate::config::CliConfig;
use crate::{Contract, ContractArgs, EXIT_OK};

/// Arguments for the `synapse-contract inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Print a JSON document instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Everything `inspect` reports about one contract.
#[derive(Debug, Serialize)]
pub struct Inventory {
    pub dialect: &'static str,
    pub info: SpecInfo,
    pub schemas: Vec<SchemaEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<OperationInfo>,
}

#[derive(Debug, Serialize)]
pub struct SchemaEntry {
    pub name: String,
    pub resource: String,
    pub source: String,
}

impl Inventory {
    pub fn of(contract: &Contract) -> Self {
        let schemas = contract
            .validator()
            .schemas()
            .iter()
            .map(|(name, compiled)| SchemaEntry {
                name: name.to_string(),
                resource: compiled.id().to_string(),
                source: compiled.source().display().to_string(),
            })
            .collect();

        match contract {
            Contract::Rest(v) => Self {
                dialect: "openapi",
                info: v.info().clone(),
                schemas,
                channels: Vec::new(),
                operations: Vec::new(),
            },
            Contract::Event(v) => Self {
                dialect: "asyncapi",
                info: v.info().clone(),
                schemas,
                channels: v.channels().values().cloned().collect(),
                operations: v.operations().values().cloned().collect(),
            },
        }
    }
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs, config: &CliConfig) -> Result<u8> {
    let contract = args.contract.load(config)?;
    let inventory = Inventory::of(&contract);

    if args.json {
        let json = serde_json::to_string_pretty(&inventory).context("failed to serialize inventory")?;
        println!("{json}");
        return Ok(EXIT_OK);
    }

    let title = inventory.info.title.as_deref().unwrap_or("(untitled)");
    let version = inventory.info.version.as_deref().unwrap_or("-");
    println!("{title} {version} ({})", inventory.dialect);
    println!("  spec: {}", contract.spec_path().display());

    println!("\nSchemas ({}):", inventory.schemas.len());
    for schema in &inventory.schemas {
        println!("  {:<32} {}", schema.name, schema.resource);
    }

    if !inventory.channels.is_empty() {
        println!("\nChannels ({}):", inventory.channels.len());
        for channel in &inventory.channels {
            let address = channel.address.as_deref().unwrap_or("-");
            println!("  {:<32} {address}", channel.name);
            if let Some(description) = &channel.description {
                println!("      {description}");
            }
        }
    }

    if !inventory.operations.is_empty() {
        println!("\nOperations ({}):", inventory.operations.len());
        for op in &inventory.operations {
            println!(
                "  {:<32} {:<10} {}",
                op.name,
                op.action.as_deref().unwrap_or("-"),
                op.channel.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(EXIT_OK)
}
