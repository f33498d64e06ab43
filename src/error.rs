//! Error types for batchbuild
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::session::SessionState;

/// Toolchain discovery errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// No toolchain found in any of the searched locations
    #[error("No build toolchain found. Searched: {}. Set BATCHBUILD_TOOLCHAIN or pass --toolchain", searched.join(", "))]
    NotFound { searched: Vec<String> },

    /// An explicitly configured toolchain path does not exist
    #[error("Toolchain '{path}' (from {source_name}) does not exist")]
    MissingExecutable { path: PathBuf, source_name: String },
}

/// Errors raised by a build engine
///
/// These never abort a batch: the coordinator turns them into a failed
/// outcome for the job that raised them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The toolchain process could not be started
    #[error("Failed to launch '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Waiting on the toolchain process failed
    #[error("Failed to wait for build of '{project}': {error}")]
    Wait { project: String, error: String },

    /// A request was submitted while no session was open
    #[error("No build session is open")]
    NoSession,

    /// A session was opened twice
    #[error("A build session is already open")]
    SessionAlreadyOpen,

    /// Engine-specific failure
    #[error("{0}")]
    Other(String),
}

/// Build coordinator errors
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// A job was created from a relative project path
    #[error("Project path '{path}' is not absolute; resolve it before dispatch")]
    RelativeProjectPath { path: PathBuf },

    /// The engine session could not be opened or closed
    #[error("Build session error: {0}")]
    Session(#[source] EngineError),

    /// Illegal session state transition
    #[error("Build session cannot move from {from} to {to}")]
    SessionLifecycle { from: SessionState, to: SessionState },
}
