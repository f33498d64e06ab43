//! Global configuration management
//!
//! Reads settings from `config.toml` in the config directory. Settings
//! cover the toolchain location, default build options and output
//! preferences. Command-line flags always take precedence.

use crate::core::engine::Properties;
use crate::core::session::BuildMode;
use crate::infra::dirs::BatchbuildDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for batchbuild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Toolchain settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Default build options
    #[serde(default)]
    pub build: BuildConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Toolchain configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Path to the toolchain executable, relative to the config file's
    /// directory; a bare name is searched on `PATH`
    pub path: Option<PathBuf>,
}

/// Default build options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Target to invoke when none is given
    pub target: Option<String>,

    /// Run builds in parallel by default
    pub parallel: Option<bool>,

    /// Upper bound on concurrent builds
    pub max_parallelism: Option<NonZeroUsize>,

    /// Projects to build when none are given on the command line
    ///
    /// Relative entries are resolved against the config file's directory.
    #[serde(default)]
    pub projects: Vec<PathBuf>,

    /// Properties passed to every build
    #[serde(default)]
    pub properties: Properties,
}

/// Output preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable quiet mode
    pub quiet: Option<bool>,

    /// Enable JSON output
    pub json: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &BatchbuildDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        if let Some(dir) = path.parent() {
            config.anchor_paths(dir);
        }
        Ok(config)
    }

    /// Make relative paths in the file relative to `dir`, the file's directory
    ///
    /// A bare toolchain name such as `msbuild` is left alone so that it is
    /// still looked up on `PATH`.
    fn anchor_paths(&mut self, dir: &Path) {
        if let Some(toolchain) = self.toolchain.path.as_mut() {
            if toolchain.is_relative() && toolchain.components().count() > 1 {
                *toolchain = dir.join(&*toolchain);
            }
        }
        for project in &mut self.build.projects {
            if project.is_relative() {
                *project = dir.join(&*project);
            }
        }
    }

    /// Get the effective default target
    #[must_use]
    pub fn target(&self) -> &str {
        self.build
            .target
            .as_deref()
            .unwrap_or(crate::config::defaults::DEFAULT_TARGET)
    }

    /// Get the effective default mode
    #[must_use]
    pub fn mode(&self) -> BuildMode {
        if self.build.parallel.unwrap_or(false) {
            BuildMode::Parallel
        } else {
            BuildMode::Sequential
        }
    }

    /// Get the effective parallelism bound
    ///
    /// Returns the configured value if set, otherwise the number of CPUs.
    #[must_use]
    pub fn max_parallelism(&self) -> NonZeroUsize {
        self.build
            .max_parallelism
            .unwrap_or_else(crate::config::defaults::default_max_parallelism)
    }
}
