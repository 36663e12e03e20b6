//! Job execution interface and result types.
//!
//! Defines [`JobExecutor`], the seam between the coordinator and the process
//! launcher, along with [`ExecutionResult`] and [`JobStatus`].

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ExecutionError;
use crate::resolver::CommandSpec;

/// Final status of a job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    /// Exit code or signal description, e.g. `exit status: 2`.
    Failure(String),
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure(reason) => write!(f, "failure ({reason})"),
        }
    }
}

/// Everything captured from one job run. Immutable once produced.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub job_label: String,
    pub status: JobStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Wall-clock time from launch to exit.
    pub duration: Duration,
    pub error: Option<ExecutionError>,
    pub started_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Success
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Result for a process that never started.
    pub fn launch_failed(
        spec: &CommandSpec,
        started_at: DateTime<Utc>,
        duration: Duration,
        err: &std::io::Error,
    ) -> Self {
        let error = ExecutionError::Launch {
            program: spec.program.clone(),
            message: err.to_string(),
        };
        Self {
            job_label: spec.label.clone(),
            status: JobStatus::Failure(error.to_string()),
            stdout: Vec::new(),
            stderr: Vec::new(),
            duration,
            error: Some(error),
            started_at,
        }
    }
}

/// Runs a resolved command to completion.
///
/// Implementations never fail: every failure mode is folded into the
/// returned [`ExecutionResult`].
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> ExecutionResult;
}
