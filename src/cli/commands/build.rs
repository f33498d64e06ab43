//! Build command implementation
//!
//! Implements `batchbuild build`: merges command-line options with the
//! config file, resolves every project to an absolute path, locates the
//! toolchain and hands the batch to the coordinator.

use anyhow::{bail, Context, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::output::{ConsoleObserver, OutputConfig};
use crate::core::coordinator::BuildCoordinator;
use crate::core::engine::Properties;
use crate::core::global_config::GlobalConfig;
use crate::core::job::BuildJob;
use crate::core::report::BuildReport;
use crate::core::session::BuildMode;
use crate::infra::dirs::BatchbuildDirs;
use crate::infra::process_engine::ProcessEngine;
use crate::infra::toolchain::ToolchainLocator;

/// Build options
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Projects given on the command line
    pub projects: Vec<PathBuf>,
    /// Target override
    pub target: Option<String>,
    /// Force parallel mode
    pub parallel: bool,
    /// Force sequential mode
    pub sequential: bool,
    /// Parallelism override
    pub max_parallelism: Option<NonZeroUsize>,
    /// Properties given on the command line
    pub properties: Vec<(String, String)>,
    /// Toolchain override
    pub toolchain: Option<PathBuf>,
    /// Config file override
    pub config: Option<PathBuf>,
}

/// Everything needed to run a batch
#[derive(Debug)]
pub struct BuildPlan {
    pub jobs: Vec<BuildJob>,
    pub mode: BuildMode,
    pub max_parallelism: NonZeroUsize,
    pub properties: Properties,
    pub toolchain: Option<PathBuf>,
}

/// Parse a `NAME=VALUE` property argument
pub fn parse_property(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("invalid property '{arg}': expected NAME=VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid property '{arg}': name is empty"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Load the config file named on the command line, or the global one
pub fn load_config(path: Option<&Path>) -> Result<GlobalConfig> {
    match path {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            GlobalConfig::load_from_path(path).with_context(|| format!("Failed to load {}", path.display()))
        }
        None => GlobalConfig::load(&BatchbuildDirs::new()).context("Failed to load global config"),
    }
}

/// Merge options over config and resolve every project against `current_dir`
///
/// All paths are made absolute here, before anything runs.
pub fn plan(current_dir: &Path, options: BuildOptions, config: &GlobalConfig) -> Result<BuildPlan> {
    let target = options.target.unwrap_or_else(|| config.target().to_string());

    let mode = if options.parallel {
        BuildMode::Parallel
    } else if options.sequential {
        BuildMode::Sequential
    } else {
        config.mode()
    };

    let max_parallelism = options.max_parallelism.unwrap_or_else(|| config.max_parallelism());

    let mut properties = config.build.properties.clone();
    properties.extend(options.properties);

    let projects = if options.projects.is_empty() {
        config.build.projects.clone()
    } else {
        options.projects
    };

    let jobs = projects
        .iter()
        .map(|project| BuildJob::resolve(project, target.as_str(), current_dir))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to resolve project paths")?;

    Ok(BuildPlan {
        jobs,
        mode,
        max_parallelism,
        properties,
        toolchain: options.toolchain.or_else(|| config.toolchain.path.clone()),
    })
}

/// Execute the build command
pub async fn execute(current_dir: &Path, options: BuildOptions) -> Result<()> {
    let config = load_config(options.config.as_deref())?;
    let output = OutputConfig::current().with_preferences(&config.output);
    let plan = plan(current_dir, options, &config)?;

    if plan.jobs.is_empty() {
        let report = BuildReport::new(plan.mode, plan.max_parallelism.get(), Vec::new());
        if output.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if !output.quiet {
            println!("No projects to build");
        }
        return Ok(());
    }

    let toolchain = ToolchainLocator::from_env()
        .with_explicit(plan.toolchain)
        .locate()?;
    tracing::info!(
        path = %toolchain.path().display(),
        kind = %toolchain.kind(),
        via = toolchain.found_via(),
        "using toolchain"
    );

    let observer = Arc::new(ConsoleObserver::new(output, plan.jobs.len()));
    let mut coordinator = BuildCoordinator::new(ProcessEngine::new(toolchain))
        .with_properties(plan.properties)
        .with_observer(observer.clone());

    let report = coordinator
        .run(plan.jobs, plan.mode, plan.max_parallelism)
        .await
        .context("Build coordination failed")?;
    observer.finish(&report);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !report.all_succeeded() {
        bail!("{} of {} builds failed", report.failed_count(), report.total());
    }

    Ok(())
}
