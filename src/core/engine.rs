//! Build engine contract
//!
//! The coordinator never builds anything itself. It hands [`BuildRequest`]s
//! to a [`BuildEngine`], either one at a time through
//! [`BuildEngine::execute`] or all at once through [`BuildEngine::submit`]
//! inside an explicitly opened session.

use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::core::job::{BuildJob, BuildOutcome, BuildStatus};
use crate::error::EngineError;

/// Global build properties (`-p:Name=Value`)
pub type Properties = BTreeMap<String, String>;

/// Channel an engine uses to report completion of one submitted request
///
/// Every sender must either be used exactly once or dropped; a dropped
/// sender is reported as a failed job.
pub type CompletionSender = oneshot::Sender<EngineOutcome>;

/// A fully resolved request for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    job: BuildJob,
    properties: Properties,
}

impl BuildRequest {
    pub fn new(job: BuildJob, properties: Properties) -> Self {
        Self { job, properties }
    }

    pub fn job(&self) -> &BuildJob {
        &self.job
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// Session-wide engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    /// Upper bound on requests the engine may run at the same time
    pub max_parallelism: NonZeroUsize,
}

impl SessionConfig {
    pub fn new(max_parallelism: NonZeroUsize) -> Self {
        Self { max_parallelism }
    }
}

/// What the engine reports for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutcome {
    pub status: BuildStatus,
    pub message: Option<String>,
    pub duration: Duration,
}

impl EngineOutcome {
    pub fn succeeded(duration: Duration) -> Self {
        Self {
            status: BuildStatus::Succeeded,
            message: None,
            duration,
        }
    }

    pub fn failed(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: BuildStatus::Failed,
            message: Some(message.into()),
            duration,
        }
    }

    /// Attach the originating job
    pub fn into_outcome(self, job: BuildJob) -> BuildOutcome {
        BuildOutcome {
            job,
            status: self.status,
            message: self.message,
            duration: self.duration,
        }
    }
}

/// The external build engine
///
/// `submit` must not block: it queues the request and returns. The engine
/// owns scheduling and must never run more than
/// [`SessionConfig::max_parallelism`] requests at once.
pub trait BuildEngine: Send + Sync {
    /// Build the engine request for a job
    fn create_request(&self, job: &BuildJob, properties: &Properties) -> BuildRequest {
        BuildRequest::new(job.clone(), properties.clone())
    }

    /// Run one request to completion
    fn execute(
        &self,
        request: BuildRequest,
    ) -> impl Future<Output = Result<EngineOutcome, EngineError>> + Send;

    /// Open the shared session used by [`BuildEngine::submit`]
    fn open_session(&mut self, config: SessionConfig) -> Result<(), EngineError>;

    /// Queue a request; its outcome is delivered through `completion`
    fn submit(&self, request: BuildRequest, completion: CompletionSender) -> Result<(), EngineError>;

    /// Close the shared session
    fn close_session(&mut self) -> Result<(), EngineError>;
}
