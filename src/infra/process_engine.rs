//! Process-backed build engine
//!
//! Runs the located toolchain once per request:
//!
//! ```text
//! <toolchain> [msbuild] <project> -t:<target> [-p:Name=Value ...] -nologo
//! ```
//!
//! Each child process runs in its project's directory, so the working
//! directory of this process is never touched. Inside a session, requests
//! are spawned onto the tokio runtime and gated by a semaphore holding
//! `max_parallelism` permits.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::core::engine::{BuildEngine, BuildRequest, CompletionSender, EngineOutcome, SessionConfig};
use crate::error::EngineError;
use crate::infra::toolchain::Toolchain;

/// Lines of output kept in a failure message
const FAILURE_TAIL_LINES: usize = 5;

/// Engine that shells out to an MSBuild-compatible toolchain
#[derive(Debug)]
pub struct ProcessEngine {
    toolchain: Arc<Toolchain>,
    session: Option<Arc<Semaphore>>,
}

impl ProcessEngine {
    pub fn new(toolchain: Toolchain) -> Self {
        Self {
            toolchain: Arc::new(toolchain),
            session: None,
        }
    }
}

/// Build the command line for one request
pub fn build_command(toolchain: &Toolchain, request: &BuildRequest) -> Command {
    let project = request.job().project();
    let mut cmd = Command::new(toolchain.path());
    cmd.args(toolchain.leading_args())
        .arg(project)
        .arg(format!("-t:{}", request.job().target()));
    for (name, value) in request.properties() {
        cmd.arg(format!("-p:{name}={value}"));
    }
    cmd.arg("-nologo");
    if let Some(dir) = project.parent() {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd
}

async fn run_build(toolchain: &Toolchain, request: &BuildRequest) -> Result<EngineOutcome, EngineError> {
    let project = request.job().project().display().to_string();
    let started = Instant::now();

    let child = build_command(toolchain, request)
        .spawn()
        .map_err(|e| EngineError::Spawn {
            program: toolchain.path().display().to_string(),
            error: e.to_string(),
        })?;
    let output = child.wait_with_output().await.map_err(|e| EngineError::Wait {
        project: project.clone(),
        error: e.to_string(),
    })?;
    let duration = started.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stdout.lines().chain(stderr.lines()) {
        debug!(project = %project, "{line}");
    }

    if output.status.success() {
        info!(project = %project, elapsed = ?duration, "build succeeded");
        Ok(EngineOutcome::succeeded(duration))
    } else {
        info!(project = %project, status = %output.status, "build failed");
        Ok(EngineOutcome::failed(failure_message(output.status, &stdout, &stderr), duration))
    }
}

/// Summarize a failed run: the exit status plus the most useful output
///
/// Diagnostics such as `error MSB4025:` or `: error CS0103:` are taken from
/// either stream (MSBuild writes them to stdout). Without any, the tail of
/// the combined output is used.
fn failure_message(status: std::process::ExitStatus, stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut diagnostics: Vec<&str> = Vec::new();
    if let Ok(pattern) = regex::Regex::new(r"(?i)\berror\s+[a-z]+\d+") {
        for line in lines.iter().copied().filter(|l| pattern.is_match(l)) {
            if !diagnostics.contains(&line) {
                diagnostics.push(line);
            }
        }
    }
    let source = if diagnostics.is_empty() { &lines } else { &diagnostics };
    let tail = &source[source.len().saturating_sub(FAILURE_TAIL_LINES)..];

    let head = match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    if tail.is_empty() {
        head
    } else {
        format!("{head}: {}", tail.join("\n"))
    }
}

impl BuildEngine for ProcessEngine {
    async fn execute(&self, request: BuildRequest) -> Result<EngineOutcome, EngineError> {
        run_build(&self.toolchain, &request).await
    }

    fn open_session(&mut self, config: SessionConfig) -> Result<(), EngineError> {
        if self.session.is_some() {
            return Err(EngineError::SessionAlreadyOpen);
        }
        debug!(max_parallelism = config.max_parallelism.get(), "opening build session");
        self.session = Some(Arc::new(Semaphore::new(config.max_parallelism.get())));
        Ok(())
    }

    fn submit(&self, request: BuildRequest, completion: CompletionSender) -> Result<(), EngineError> {
        let permits = Arc::clone(self.session.as_ref().ok_or(EngineError::NoSession)?);
        let toolchain = Arc::clone(&self.toolchain);

        tokio::spawn(async move {
            let outcome = match permits.acquire().await {
                Ok(_permit) => run_build(&toolchain, &request)
                    .await
                    .unwrap_or_else(|e| EngineOutcome::failed(e.to_string(), Duration::ZERO)),
                Err(_) => EngineOutcome::failed("build session closed before the job started", Duration::ZERO),
            };
            let _ = completion.send(outcome);
        });
        Ok(())
    }

    fn close_session(&mut self) -> Result<(), EngineError> {
        let permits = self.session.take().ok_or(EngineError::NoSession)?;
        permits.close();
        debug!("closed build session");
        Ok(())
    }
}
