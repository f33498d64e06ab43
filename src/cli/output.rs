//! Output formatting and progress indicators
//!
//! This module provides the console side of a build: status lines, a
//! progress bar for the batch, and error display.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::OnceLock;

use crate::core::coordinator::BuildObserver;
use crate::core::global_config;
use crate::core::job::{BuildJob, BuildOutcome};
use crate::core::report::BuildReport;
use crate::core::session::BuildMode;

static GLOBAL_OUTPUT: OnceLock<OutputConfig> = OnceLock::new();

/// Output settings derived from the global command-line flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Emit machine-readable JSON instead of status lines
    pub json: bool,
    /// Verbosity level (-v count)
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self { quiet, json, verbose }
    }

    /// Make this configuration visible to every command
    pub fn apply_global(self) {
        let _ = GLOBAL_OUTPUT.set(self);
    }

    /// The configuration applied by [`OutputConfig::apply_global`], or the default
    pub fn current() -> Self {
        GLOBAL_OUTPUT.get().copied().unwrap_or_default()
    }

    /// Fold in preferences from the config file; flags set on the command line win
    #[must_use]
    pub fn with_preferences(self, prefs: &global_config::OutputConfig) -> Self {
        Self {
            quiet: self.quiet || prefs.quiet.unwrap_or(false),
            json: self.json || prefs.json.unwrap_or(false),
            verbose: self.verbose,
        }
    }

    /// Whether human-readable status lines should be printed
    pub fn is_human(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Default log directive for this verbosity
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Display an error and its causes on stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Create a progress bar for build steps
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} projects ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Prints status lines as the coordinator reports progress
///
/// ```text
/// ℹ Building 2 project(s) (parallel)
/// Building App.csproj (Build)...
/// Building Lib.csproj (Build)...
/// =====> [SUCCEEDED] Lib.csproj (Build)
/// =====> [FAILED] App.csproj (Build)
/// ```
pub struct ConsoleObserver {
    output: OutputConfig,
    progress: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(output: OutputConfig, total: usize) -> Self {
        let progress = if output.is_human() {
            create_build_bar(total as u64)
        } else {
            ProgressBar::hidden()
        };
        Self { output, progress }
    }

    /// Clear the progress bar and print the summary line
    pub fn finish(&self, report: &BuildReport) {
        self.progress.finish_and_clear();
        if !self.output.is_human() {
            return;
        }
        if report.all_succeeded() {
            println!(
                "{} Build succeeded: {} project(s)",
                status::SUCCESS,
                report.succeeded_count()
            );
        } else {
            println!(
                "{} Build failed: {} succeeded, {} failed",
                status::ERROR,
                report.succeeded_count(),
                report.failed_count()
            );
            for outcome in report.failures() {
                println!("  {} {}", status::ERROR, outcome.job);
            }
        }
    }

    fn line(&self, message: &str) {
        if self.output.is_human() {
            self.progress.suspend(|| println!("{message}"));
        }
    }
}

impl BuildObserver for ConsoleObserver {
    fn on_batch_start(&self, jobs: &[BuildJob], mode: BuildMode) {
        self.line(&format!("{} Building {} project(s) ({mode})", status::INFO, jobs.len()));
    }

    fn on_dispatch(&self, job: &BuildJob) {
        self.progress.set_message(job.display_name());
        self.line(&format!("Building {job}..."));
    }

    fn on_complete(&self, outcome: &BuildOutcome) {
        self.progress.inc(1);
        self.line(&format_outcome(outcome));
    }
}

/// Format the completion line for one outcome
pub fn format_outcome(outcome: &BuildOutcome) -> String {
    let mut line = format!("=====> [{}] {}", outcome.status, outcome.job);
    if let Some(message) = &outcome.message {
        for detail in message.lines() {
            line.push_str("\n       ");
            line.push_str(detail);
        }
    }
    line
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
