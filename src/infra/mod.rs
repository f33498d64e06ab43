//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem locations, toolchain discovery
//! and external processes. This module is the only place where side
//! effects occur.

pub mod dirs;
pub mod process_engine;
pub mod toolchain;
