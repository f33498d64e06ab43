//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Fake toolchain used instead of MSBuild
///
/// Appends `<project> <target> <properties...> @ <cwd>` to `build.log` next
/// to the script, fails for projects whose file name contains "fail", and
/// sleeps briefly for projects whose file name contains "slow".
#[allow(dead_code)]
pub const FAKE_TOOLCHAIN: &str = r#"#!/bin/sh
LOG="$(dirname "$0")/build.log"
echo "$* @ $(pwd)" >> "$LOG"
case "$(basename "$1")" in
  *fail*) echo "error MSB4025: The project file could not be loaded." ; exit 1 ;;
  *slow*) sleep 0.2 ;;
esac
echo "Build succeeded."
exit 0
"#;

/// Test project context
///
/// Creates a temporary directory holding project files, a fake toolchain
/// and an isolated config directory.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_dir("config");
        project.create_dir("tools");
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Path of the fake toolchain script
    pub fn toolchain_path(&self) -> PathBuf {
        self.dir.path().join("tools").join("fake-msbuild")
    }

    /// Install the fake toolchain
    #[cfg(unix)]
    pub fn install_toolchain(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.toolchain_path();
        std::fs::write(&path, FAKE_TOOLCHAIN).expect("Failed to write toolchain");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make toolchain executable");
        path
    }

    /// Lines the fake toolchain wrote, one per invocation
    pub fn build_log(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("tools").join("build.log"))
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Write the global config file
    pub fn write_config(&self, content: &str) {
        self.create_file("config/config.toml", content);
    }

    /// Base command: runs in the project directory with an isolated environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_batchbuild"));
        cmd.current_dir(self.path())
            .env("BATCHBUILD_CONFIG_DIR", self.dir.path().join("config"))
            .env("BATCHBUILD_TOOLCHAIN", self.toolchain_path())
            .env_remove("MSBUILD_EXE_PATH")
            .env_remove("VSINSTALLDIR")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run batchbuild with the given arguments
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("Failed to execute batchbuild")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal project file; the fake toolchain never reads it
#[allow(dead_code)]
pub const SAMPLE_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
</Project>
"#;
