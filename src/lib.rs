//! Batchbuild - drive batches of MSBuild project builds
//!
//! This library locates an MSBuild-compatible toolchain and runs a list of
//! project builds through it, one after another or concurrently, reporting
//! one outcome per project.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build coordination (no I/O operations)
//! - [`infra`] - Infrastructure layer (filesystem, toolchain, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
