//! Coordinator session state
//!
//! One [`CoordinatorSession`] exists per batch. It tracks the mode, the
//! parallelism bound handed to the engine, how many jobs are still
//! outstanding, and the lifecycle of the engine session:
//!
//! ```text
//! Idle -> SessionOpen -> AllDispatched -> AllCompleted -> SessionClosed
//! ```
//!
//! `SessionClosed` can only follow `AllCompleted`, and `AllCompleted` can
//! only be entered once `pending` has reached zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

use crate::error::CoordinatorError;

/// Execution discipline for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// One job at a time, in input order
    #[default]
    Sequential,
    /// All jobs submitted up front, engine schedules them
    Parallel,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// Engine session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SessionOpen,
    AllDispatched,
    AllCompleted,
    SessionClosed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::SessionOpen => "SessionOpen",
            Self::AllDispatched => "AllDispatched",
            Self::AllCompleted => "AllCompleted",
            Self::SessionClosed => "SessionClosed",
        };
        f.write_str(name)
    }
}

/// Per-batch bookkeeping
#[derive(Debug)]
pub struct CoordinatorSession {
    mode: BuildMode,
    max_parallelism: NonZeroUsize,
    pending: usize,
    state: SessionState,
}

impl CoordinatorSession {
    /// Start a session for `job_count` jobs
    pub fn new(mode: BuildMode, max_parallelism: NonZeroUsize, job_count: usize) -> Self {
        Self {
            mode,
            max_parallelism,
            pending: job_count,
            state: SessionState::Idle,
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn max_parallelism(&self) -> NonZeroUsize {
        self.max_parallelism
    }

    /// Jobs that have not produced an outcome yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether every job has produced its outcome
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    /// Record one outcome
    ///
    /// Returns the number of jobs still pending. Recording more outcomes
    /// than there are jobs is a lifecycle violation.
    pub fn record_completion(&mut self) -> Result<usize, CoordinatorError> {
        if self.pending == 0 {
            return Err(CoordinatorError::SessionLifecycle {
                from: self.state,
                to: SessionState::AllCompleted,
            });
        }
        self.pending -= 1;
        Ok(self.pending)
    }

    /// Move to `next`, rejecting any transition the lifecycle does not allow
    pub fn transition(&mut self, next: SessionState) -> Result<(), CoordinatorError> {
        use SessionState::{AllCompleted, AllDispatched, Idle, SessionClosed, SessionOpen};

        let allowed = match (self.state, next) {
            (Idle, SessionOpen) | (SessionOpen, AllDispatched) | (AllCompleted, SessionClosed) => true,
            (AllDispatched, AllCompleted) => self.pending == 0,
            _ => false,
        };

        if !allowed {
            return Err(CoordinatorError::SessionLifecycle {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!(from = %self.state, to = %next, "session transition");
        self.state = next;
        Ok(())
    }
}
