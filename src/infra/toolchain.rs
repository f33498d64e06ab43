//! Toolchain discovery
//!
//! Locates the executable that actually builds projects. Lookup order:
//!
//! 1. an explicit path (`--toolchain` or `toolchain.path` in config)
//! 2. `BATCHBUILD_TOOLCHAIN`
//! 3. `MSBUILD_EXE_PATH`
//! 4. `VSINSTALLDIR` (Visual Studio developer prompt)
//! 5. `msbuild`, `MSBuild.exe` or `dotnet` on `PATH`
//!
//! The first two are authoritative: if they name something that does not
//! exist, discovery fails instead of falling through.

use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ToolchainError;

/// Explicit toolchain override
pub const ENV_TOOLCHAIN: &str = "BATCHBUILD_TOOLCHAIN";

/// Path to an MSBuild executable, as used by the MSBuild locator tooling
pub const ENV_MSBUILD_EXE_PATH: &str = "MSBUILD_EXE_PATH";

/// Visual Studio installation root, set by the developer command prompt
pub const ENV_VS_INSTALL_DIR: &str = "VSINSTALLDIR";

/// MSBuild location relative to a Visual Studio installation
const VS_MSBUILD_RELATIVE: &[&str] = &["MSBuild", "Current", "Bin", "MSBuild.exe"];

/// Executables searched for on `PATH`, in order
const PATH_CANDIDATES: &[&str] = &["msbuild", "MSBuild.exe", "dotnet"];

/// Flavour of toolchain, which decides the command line prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// Standalone `msbuild` / `MSBuild.exe`
    MsBuild,
    /// `dotnet`, invoked as `dotnet msbuild`
    DotnetCli,
    /// Anything else; receives MSBuild-style arguments
    Custom,
}

impl ToolchainKind {
    /// Guess the kind from an executable path
    pub fn detect(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match stem.as_str() {
            "msbuild" => Self::MsBuild,
            "dotnet" => Self::DotnetCli,
            _ => Self::Custom,
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MsBuild => write!(f, "msbuild"),
            Self::DotnetCli => write!(f, "dotnet msbuild"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// A located toolchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    path: PathBuf,
    kind: ToolchainKind,
    found_via: String,
}

impl Toolchain {
    /// Wrap an executable path, detecting its kind
    pub fn new(path: PathBuf, found_via: impl Into<String>) -> Self {
        let kind = ToolchainKind::detect(&path);
        Self {
            path,
            kind,
            found_via: found_via.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ToolchainKind {
        self.kind
    }

    /// Where the toolchain was found (flag, variable, or `PATH`)
    pub fn found_via(&self) -> &str {
        &self.found_via
    }

    /// Arguments that go before the project path
    pub fn leading_args(&self) -> &'static [&'static str] {
        match self.kind {
            ToolchainKind::DotnetCli => &["msbuild"],
            ToolchainKind::MsBuild | ToolchainKind::Custom => &[],
        }
    }

    /// Ask the toolchain for its version
    pub fn version(&self) -> Option<String> {
        std::process::Command::new(&self.path)
            .args(self.leading_args())
            .args(["-version", "-nologo"])
            .output()
            .ok()
            .and_then(|output| {
                if output.status.success() {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    extract_version(&stdout)
                } else {
                    None
                }
            })
    }
}

/// Extract the first version-looking token from command output
pub fn extract_version(output: &str) -> Option<String> {
    let version_regex = regex::Regex::new(r"v?(\d+\.\d+(?:\.\d+)*(?:[-+][\w.]+)?)").ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Toolchain discovery over a snapshot of the environment
#[derive(Debug, Clone, Default)]
pub struct ToolchainLocator {
    explicit: Option<PathBuf>,
    vars: HashMap<String, OsString>,
    search_path: Option<OsString>,
}

impl ToolchainLocator {
    /// Snapshot the relevant environment variables of this process
    pub fn from_env() -> Self {
        let vars = [ENV_TOOLCHAIN, ENV_MSBUILD_EXE_PATH, ENV_VS_INSTALL_DIR]
            .into_iter()
            .filter_map(|name| std::env::var_os(name).map(|value| (name.to_string(), value)))
            .collect();
        Self {
            explicit: None,
            vars,
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Prefer this path over everything else
    #[must_use]
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Set or override one environment variable in the snapshot
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<OsString>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Replace the `PATH` used for the final search
    #[must_use]
    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    /// Find a toolchain
    pub fn locate(&self) -> Result<Toolchain, ToolchainError> {
        let mut searched = Vec::new();

        if let Some(path) = &self.explicit {
            return self.require(path, "--toolchain");
        }
        searched.push("--toolchain".to_string());

        if let Some(value) = self.var(ENV_TOOLCHAIN) {
            return self.require(Path::new(value), ENV_TOOLCHAIN);
        }
        searched.push(ENV_TOOLCHAIN.to_string());

        if let Some(value) = self.var(ENV_MSBUILD_EXE_PATH) {
            let path = PathBuf::from(value);
            if path.is_file() {
                return Ok(Toolchain::new(absolute(&path), ENV_MSBUILD_EXE_PATH));
            }
            debug!(path = %path.display(), "{ENV_MSBUILD_EXE_PATH} points to a missing file");
        }
        searched.push(ENV_MSBUILD_EXE_PATH.to_string());

        if let Some(value) = self.var(ENV_VS_INSTALL_DIR) {
            let path = VS_MSBUILD_RELATIVE
                .iter()
                .fold(PathBuf::from(value), |acc, part| acc.join(part));
            if path.is_file() {
                return Ok(Toolchain::new(absolute(&path), ENV_VS_INSTALL_DIR));
            }
            debug!(path = %path.display(), "no MSBuild under {ENV_VS_INSTALL_DIR}");
        }
        searched.push(ENV_VS_INSTALL_DIR.to_string());

        for candidate in PATH_CANDIDATES {
            if let Some(path) = self.which(candidate) {
                return Ok(Toolchain::new(path, "PATH"));
            }
        }
        searched.push(format!("PATH ({})", PATH_CANDIDATES.join(", ")));

        Err(ToolchainError::NotFound { searched })
    }

    fn var(&self, name: &str) -> Option<&OsString> {
        self.vars.get(name).filter(|v| !v.is_empty())
    }

    /// Resolve an authoritative location; bare names are looked up on `PATH`
    fn require(&self, path: &Path, source: &str) -> Result<Toolchain, ToolchainError> {
        if path.is_file() {
            return Ok(Toolchain::new(absolute(path), source));
        }
        if path.components().count() == 1 {
            if let Some(found) = path.to_str().and_then(|name| self.which(name)) {
                return Ok(Toolchain::new(found, source));
            }
        }
        Err(ToolchainError::MissingExecutable {
            path: path.to_path_buf(),
            source_name: source.to_string(),
        })
    }

    fn which(&self, binary: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        which::which_in(binary, self.search_path.as_ref(), cwd).ok()
    }
}

/// Anchor a relative path at the current directory
///
/// Builds run with the project's directory as their working directory, so
/// a relative program path would otherwise be looked up from there.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
