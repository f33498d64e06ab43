//! Core business logic module
//!
//! This module contains the build coordination logic. It has NO direct
//! I/O: processes and the filesystem are reached through
//! [`crate::infra`] or through the [`engine::BuildEngine`] trait.
//!
//! # Submodules
//!
//! - [`job`] - Build jobs and outcomes
//! - [`engine`] - Build engine contract
//! - [`session`] - Coordinator session state machine
//! - [`coordinator`] - Sequential and parallel batch execution
//! - [`report`] - Batch report
//! - [`global_config`] - Global configuration management

pub mod coordinator;
pub mod engine;
pub mod global_config;
pub mod job;
pub mod report;
pub mod session;
