//! Batch build report

use serde::{Serialize, Serializer};

use crate::core::job::{BuildOutcome, BuildStatus};
use crate::core::session::BuildMode;

/// All outcomes of one batch
///
/// Serializes with the aggregate counts alongside the outcomes, so the
/// JSON document answers "did the batch pass" without recounting.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// How the batch was run
    pub mode: BuildMode,
    /// Parallelism bound handed to the engine (1 in sequential mode)
    pub max_parallelism: usize,
    /// One outcome per job; input order when sequential, completion order when parallel
    pub outcomes: Vec<BuildOutcome>,
}

impl BuildReport {
    pub fn new(mode: BuildMode, max_parallelism: usize, outcomes: Vec<BuildOutcome>) -> Self {
        Self {
            mode,
            max_parallelism,
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(BuildStatus::Succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.count(BuildStatus::Failed)
    }

    /// True when every job succeeded (vacuously true for an empty batch)
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// Failed outcomes
    pub fn failures(&self) -> impl Iterator<Item = &BuildOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    fn count(&self, status: BuildStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    mode: BuildMode,
    max_parallelism: usize,
    total: usize,
    succeeded: usize,
    failed: usize,
    all_succeeded: bool,
    outcomes: &'a [BuildOutcome],
}

impl Serialize for BuildReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportDocument {
            mode: self.mode,
            max_parallelism: self.max_parallelism,
            total: self.total(),
            succeeded: self.succeeded_count(),
            failed: self.failed_count(),
            all_succeeded: self.all_succeeded(),
            outcomes: &self.outcomes,
        }
        .serialize(serializer)
    }
}
