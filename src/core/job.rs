//! Build jobs and their outcomes
//!
//! A [`BuildJob`] names one project and one target. Its project path is
//! made absolute when the job is created, because the external engine is
//! free to change working directory while it runs.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::CoordinatorError;

/// One request to build a project against a target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildJob {
    project: PathBuf,
    target: String,
}

impl BuildJob {
    /// Create a job from an already absolute project path
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::RelativeProjectPath`] if `project` is relative.
    pub fn new(project: impl Into<PathBuf>, target: impl Into<String>) -> Result<Self, CoordinatorError> {
        let project = project.into();
        if !project.is_absolute() {
            return Err(CoordinatorError::RelativeProjectPath { path: project });
        }
        Ok(Self {
            project: normalize(&project),
            target: target.into(),
        })
    }

    /// Create a job, resolving `project` against `base_dir` if it is relative
    ///
    /// `base_dir` must itself be absolute (normally the process working
    /// directory captured once, before any build starts).
    pub fn resolve(
        project: impl AsRef<Path>,
        target: impl Into<String>,
        base_dir: &Path,
    ) -> Result<Self, CoordinatorError> {
        let project = project.as_ref();
        if project.is_absolute() {
            Self::new(project, target)
        } else {
            Self::new(base_dir.join(project), target)
        }
    }

    /// Absolute path of the project file
    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Target to invoke
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Short name used in status lines (the project file name)
    pub fn display_name(&self) -> String {
        self.project
            .file_name()
            .map_or_else(|| self.project.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

impl fmt::Display for BuildJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.target)
    }
}

/// Lexically remove `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                if !matches!(out.components().next_back(), Some(Component::RootDir | Component::Prefix(_)) | None) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Terminal result of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// The engine reported success
    Succeeded,
    /// The engine reported failure, or the job could not be run
    Failed,
}

impl BuildStatus {
    /// Whether this is [`BuildStatus::Succeeded`]
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one job, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    /// The job this outcome belongs to
    pub job: BuildJob,
    /// Succeeded or failed
    pub status: BuildStatus,
    /// Failure reason, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Wall-clock time spent in the engine
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
}

impl BuildOutcome {
    /// Successful outcome
    pub fn succeeded(job: BuildJob, duration: Duration) -> Self {
        Self {
            job,
            status: BuildStatus::Succeeded,
            message: None,
            duration,
        }
    }

    /// Failed outcome with a reason
    pub fn failed(job: BuildJob, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            job,
            status: BuildStatus::Failed,
            message: Some(message.into()),
            duration,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_duration_ms<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
