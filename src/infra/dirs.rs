//! Platform-specific directory management
//!
//! Provides the configuration directory for batchbuild, following the XDG
//! Base Directory Specification on Linux and standard locations on macOS
//! and Windows.
//!
//! `BATCHBUILD_CONFIG_DIR` overrides the default location.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "BATCHBUILD_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "batchbuild";

/// Name of the global config file
const CONFIG_FILE: &str = "config.toml";

/// Platform-specific directory provider for batchbuild
#[derive(Debug, Clone)]
pub struct BatchbuildDirs {
    config_dir: PathBuf,
}

impl BatchbuildDirs {
    /// Create a new `BatchbuildDirs` instance
    ///
    /// Checks the environment first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Use a fixed config directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/batchbuild` or `~/.config/batchbuild`
    /// - macOS: `~/Library/Application Support/batchbuild`
    /// - Windows: `%APPDATA%\batchbuild`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Some(path) = env::var_os(ENV_CONFIG_DIR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for BatchbuildDirs {
    fn default() -> Self {
        Self::new()
    }
}
