//! Subprocess execution for build jobs.
//!
//! [`ProcessExecutor`] spawns the resolved program with
//! [`tokio::process::Command`], captures stdout/stderr into memory and waits
//! for exit. No timeout is imposed: a hung script runs until something
//! outside this process stops it.

use std::process::Stdio;
use std::time::Instant;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::executor::{ExecutionResult, JobExecutor, JobStatus};
use crate::error::ExecutionError;
use crate::resolver::CommandSpec;

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output past the limit is drained and discarded so the child never blocks
/// on a full pipe.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Launches jobs as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait::async_trait]
impl JobExecutor for ProcessExecutor {
    async fn execute(&self, spec: &CommandSpec) -> ExecutionResult {
        run_command(spec).await
    }
}

/// Spawn `spec`, capture its output and wait for it to exit.
pub async fn run_command(spec: &CommandSpec) -> ExecutionResult {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let started_at = Utc::now();
    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::debug!(program = %spec.program, error = %e, "Job failed to launch");
            return ExecutionResult::launch_failed(spec, started_at, start.elapsed(), &e);
        }
    };

    // Read both pipes concurrently with `wait()` so neither can fill up.
    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let wait_result = child.wait().await;
    let duration = start.elapsed();

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    let (status, error) = match wait_result {
        Ok(exit) if exit.success() => (JobStatus::Success, None),
        Ok(exit) => {
            let description = exit.to_string();
            (
                JobStatus::Failure(description.clone()),
                Some(ExecutionError::Exited(description)),
            )
        }
        Err(e) => {
            let error = ExecutionError::Wait {
                program: spec.program.clone(),
                message: e.to_string(),
            };
            (JobStatus::Failure(error.to_string()), Some(error))
        }
    };

    ExecutionResult {
        job_label: spec.label.clone(),
        status,
        stdout,
        stderr,
        duration,
        error,
        started_at,
    }
}

/// Read a stream to EOF, keeping at most [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}
