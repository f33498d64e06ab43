//! Build coordinator
//!
//! Drives a batch of [`BuildJob`]s through a [`BuildEngine`] and does not
//! return until every job has produced exactly one [`BuildOutcome`].
//!
//! - **Sequential**: each job is executed and awaited before the next one
//!   starts. Outcomes come back in input order.
//! - **Parallel**: one engine session is opened, every job is submitted
//!   with its own completion channel, and the coordinator waits until all
//!   channels have delivered (the barrier). Only then is the session closed.
//!
//! A failing job never stops the batch. Engine errors, rejected
//! submissions and completion channels dropped by the engine all become a
//! failed outcome for the job concerned.

use futures::stream::{FuturesUnordered, StreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::core::engine::{BuildEngine, Properties, SessionConfig};
use crate::core::job::{BuildJob, BuildOutcome};
use crate::core::report::BuildReport;
use crate::core::session::{BuildMode, CoordinatorSession, SessionState};
use crate::error::CoordinatorError;

/// Receives progress notifications from the coordinator
///
/// Notifications are purely observational and are always delivered on the
/// coordinator's own task.
pub trait BuildObserver: Send + Sync {
    /// Called once per batch, before anything is dispatched
    fn on_batch_start(&self, _jobs: &[BuildJob], _mode: BuildMode) {}

    /// Called right before a job is handed to the engine
    fn on_dispatch(&self, _job: &BuildJob) {}

    /// Called once per outcome
    fn on_complete(&self, _outcome: &BuildOutcome) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}

/// Coordinates a batch of builds against an engine
pub struct BuildCoordinator<E> {
    engine: E,
    properties: Properties,
    observer: Arc<dyn BuildObserver>,
}

impl<E: BuildEngine> BuildCoordinator<E> {
    /// Create a coordinator with no properties and no observer
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            properties: Properties::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Set the global properties passed with every request
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Set the progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn BuildObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run a batch in the given mode and collect a report
    pub async fn run(
        &mut self,
        jobs: Vec<BuildJob>,
        mode: BuildMode,
        max_parallelism: NonZeroUsize,
    ) -> Result<BuildReport, CoordinatorError> {
        match mode {
            BuildMode::Sequential => {
                let outcomes = self.run_sequential(jobs).await?;
                Ok(BuildReport::new(mode, 1, outcomes))
            }
            BuildMode::Parallel => {
                let outcomes = self.run_parallel(jobs, max_parallelism).await?;
                Ok(BuildReport::new(mode, max_parallelism.get(), outcomes))
            }
        }
    }

    /// Execute jobs one at a time, in order
    pub async fn run_sequential(&self, jobs: Vec<BuildJob>) -> Result<Vec<BuildOutcome>, CoordinatorError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        self.observer.on_batch_start(&jobs, BuildMode::Sequential);
        let mut session = CoordinatorSession::new(BuildMode::Sequential, NonZeroUsize::MIN, jobs.len());
        info!(jobs = session.pending(), mode = %session.mode(), "starting build");
        let mut outcomes = Vec::with_capacity(jobs.len());

        for job in jobs {
            self.observer.on_dispatch(&job);
            let request = self.engine.create_request(&job, &self.properties);
            let started = Instant::now();

            let outcome = match self.engine.execute(request).await {
                Ok(result) => result.into_outcome(job),
                Err(e) => {
                    warn!(project = %job.project().display(), error = %e, "engine error");
                    BuildOutcome::failed(job, e.to_string(), started.elapsed())
                }
            };

            session.record_completion()?;
            self.observer.on_complete(&outcome);
            outcomes.push(outcome);
        }

        debug_assert!(session.is_complete());
        Ok(outcomes)
    }

    /// Submit every job to one engine session and wait for all of them
    pub async fn run_parallel(
        &mut self,
        jobs: Vec<BuildJob>,
        max_parallelism: NonZeroUsize,
    ) -> Result<Vec<BuildOutcome>, CoordinatorError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        self.observer.on_batch_start(&jobs, BuildMode::Parallel);
        let mut session = CoordinatorSession::new(BuildMode::Parallel, max_parallelism, jobs.len());
        info!(
            jobs = session.pending(),
            mode = %session.mode(),
            max_parallelism = session.max_parallelism().get(),
            "starting build"
        );

        self.engine
            .open_session(SessionConfig::new(session.max_parallelism()))
            .map_err(CoordinatorError::Session)?;
        session.transition(SessionState::SessionOpen)?;

        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut in_flight = FuturesUnordered::new();

        for job in jobs {
            let (tx, rx) = oneshot::channel();
            let request = self.engine.create_request(&job, &self.properties);
            self.observer.on_dispatch(&job);

            match self.engine.submit(request, tx) {
                Ok(()) => {
                    debug!(project = %job.project().display(), "submitted");
                    in_flight.push(async move { (job, rx.await) });
                }
                Err(e) => {
                    warn!(project = %job.project().display(), error = %e, "submission rejected");
                    let outcome = BuildOutcome::failed(job, e.to_string(), Duration::ZERO);
                    session.record_completion()?;
                    self.observer.on_complete(&outcome);
                    outcomes.push(outcome);
                }
            }
        }
        session.transition(SessionState::AllDispatched)?;

        // Barrier: one receive per submitted job
        while let Some((job, received)) = in_flight.next().await {
            let outcome = match received {
                Ok(result) => result.into_outcome(job),
                Err(_) => {
                    warn!(project = %job.project().display(), "engine dropped completion");
                    BuildOutcome::failed(job, "engine finished without reporting an outcome", Duration::ZERO)
                }
            };

            let remaining = session.record_completion()?;
            debug!(project = %outcome.job.project().display(), status = %outcome.status, remaining, "completed");
            self.observer.on_complete(&outcome);
            outcomes.push(outcome);
        }

        session.transition(SessionState::AllCompleted)?;
        self.engine.close_session().map_err(CoordinatorError::Session)?;
        session.transition(SessionState::SessionClosed)?;

        Ok(outcomes)
    }
}
