//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod locate;

use anyhow::Result;
use clap::Subcommand;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build one or more projects
    Build {
        /// Project files to build (defaults to `build.projects` from the config file)
        projects: Vec<PathBuf>,

        /// Target to invoke on every project
        #[arg(short, long)]
        target: Option<String>,

        /// Submit all projects at once and let the toolchain run them concurrently
        #[arg(long, conflicts_with = "sequential")]
        parallel: bool,

        /// Build one project at a time, even if the config enables parallel builds
        #[arg(long)]
        sequential: bool,

        /// Maximum number of concurrent builds in parallel mode
        #[arg(short = 'j', long, value_name = "N")]
        max_parallelism: Option<NonZeroUsize>,

        /// Build property passed to every project (repeatable)
        #[arg(short = 'p', long = "property", value_name = "NAME=VALUE", value_parser = build::parse_property)]
        properties: Vec<(String, String)>,

        /// Toolchain executable to use instead of discovering one
        #[arg(long, value_name = "PATH")]
        toolchain: Option<PathBuf>,

        /// Config file to use instead of the global one
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Show which toolchain would be used
    Locate {
        /// Toolchain executable to check instead of discovering one
        #[arg(long, value_name = "PATH")]
        toolchain: Option<PathBuf>,

        /// Config file to use instead of the global one
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Self::Build {
                projects,
                target,
                parallel,
                sequential,
                max_parallelism,
                properties,
                toolchain,
                config,
            } => {
                let current_dir = std::env::current_dir()?;
                let options = build::BuildOptions {
                    projects,
                    target,
                    parallel,
                    sequential,
                    max_parallelism,
                    properties,
                    toolchain,
                    config,
                };
                build::execute(&current_dir, options).await
            }
            Self::Locate { toolchain, config } => locate::execute(toolchain, config.as_deref()),
        }
    }
}
