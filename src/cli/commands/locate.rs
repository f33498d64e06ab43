//! Locate command implementation
//!
//! Implements `batchbuild locate`: runs toolchain discovery and reports
//! what was found without building anything.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::commands::build::load_config;
use crate::cli::output::{status, OutputConfig};
use crate::infra::toolchain::{Toolchain, ToolchainLocator};

#[derive(Serialize)]
struct LocateReport<'a> {
    #[serde(flatten)]
    toolchain: &'a Toolchain,
    version: Option<String>,
}

/// Execute the locate command
pub fn execute(toolchain: Option<PathBuf>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let output = OutputConfig::current().with_preferences(&config.output);

    let located = ToolchainLocator::from_env()
        .with_explicit(toolchain.or(config.toolchain.path))
        .locate()?;
    let version = located.version();

    if output.json {
        let report = LocateReport {
            toolchain: &located,
            version,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if output.quiet {
        println!("{}", located.path().display());
        return Ok(());
    }

    println!("{} Toolchain: {}", status::SUCCESS, located.path().display());
    println!("  Kind: {}", located.kind());
    println!("  Found via: {}", located.found_via());
    match version {
        Some(version) => println!("  Version: {version}"),
        None => println!("  {} Version: unknown", status::WARNING),
    }

    Ok(())
}
