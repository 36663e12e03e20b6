//! Dispatch coordination.
//!
//! [`DispatchCoordinator`] turns a webhook body into a running job:
//!
//! 1. Decode the repository name.
//! 2. Load the configuration fresh from its [`ConfigSource`].
//! 3. Resolve the repository to a [`CommandSpec`].
//! 4. Acknowledge the caller and spawn the job in the background.
//! 5. When the job exits, archive the result, then notify if the job failed
//!    or `Email.Always` is set, then write a one-line summary.
//!
//! Steps 1–3 are the only failures a caller ever sees. Everything after the
//! acknowledgment is isolated: a failing sink is logged and the remaining
//! steps still run. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use githook_core::config::{Config, ConfigSource};
use githook_core::error::{ConfigError, DecodeError, ResolutionError};
use githook_core::resolver::{self, CommandSpec};
use githook_core::scripting::{ExecutionResult, JobExecutor, JobStatus};
use githook_core::webhook;
use githook_events::report::subject_line;
use githook_events::{JobReport, LogSink, SinkKind, SinkProvider};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::handler::RequestHandler;
use crate::log::{DispatchLog, TracingLog};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A request rejected before any job was started.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(e) => e.code(),
            Self::Config(e) => e.code(),
            Self::Resolution(e) => e.code(),
        }
    }

    /// Body returned to the caller, e.g.
    /// `ERROR UnknownRepository: no job configured for repository: ghost`.
    pub fn response_text(&self) -> String {
        format!("ERROR {}: {self}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened after the acknowledgment was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub repository: String,
    pub status: JobStatus,
    pub duration: Duration,
    /// URL of the archived report, when an archive sink succeeded.
    pub artifact_url: Option<String>,
    /// Whether at least one notify sink was attempted.
    pub notified: bool,
    /// `"<sink>: <error>"` for every sink that failed.
    pub sink_failures: Vec<String>,
}

impl DispatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// A job accepted for background execution.
#[derive(Debug)]
pub struct Dispatched {
    pub repository: String,
    /// Resolves once the job has exited and every sink has been attempted.
    pub handle: JoinHandle<DispatchOutcome>,
}

/// Acknowledgment body sent before the job runs.
pub fn acknowledgment(repository: &str) -> String {
    format!("Running job for repository: {repository}")
}

// ---------------------------------------------------------------------------
// DispatchCoordinator
// ---------------------------------------------------------------------------

/// Orchestrates decode → resolve → execute → sink fan-out.
///
/// Cheap to clone; all collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct DispatchCoordinator {
    config: Arc<dyn ConfigSource>,
    executor: Arc<dyn JobExecutor>,
    sinks: Arc<dyn SinkProvider>,
    log: Arc<dyn DispatchLog>,
    tracker: TaskTracker,
}

impl DispatchCoordinator {
    pub fn new(
        config: Arc<dyn ConfigSource>,
        executor: Arc<dyn JobExecutor>,
        sinks: Arc<dyn SinkProvider>,
    ) -> Self {
        Self {
            config,
            executor,
            sinks,
            log: Arc::new(TracingLog),
            tracker: TaskTracker::new(),
        }
    }

    /// Replace the default `tracing`-backed dispatch log.
    pub fn with_log(mut self, log: Arc<dyn DispatchLog>) -> Self {
        self.log = log;
        self
    }

    /// Decode, resolve and spawn. Must be called within a tokio runtime.
    ///
    /// Returns as soon as the job is spawned; the job's progress is only
    /// observable through the returned handle, the sinks and the log.
    pub fn dispatch(&self, request: &[u8]) -> Result<Dispatched, DispatchError> {
        let repository = webhook::decode_repository(request)?;
        let config = self.config.load()?;
        let spec = resolver::resolve(&config.repositories, &repository)?;

        self.log.info(&format!(
            "Running job for repository: {repository} dir: {} script: {}",
            spec.working_directory.display(),
            spec.program
        ));

        let job = BackgroundJob {
            config,
            spec,
            executor: Arc::clone(&self.executor),
            sinks: Arc::clone(&self.sinks),
            log: Arc::clone(&self.log),
        };
        let span = tracing::info_span!("dispatch", repository = %repository);
        let handle = self.tracker.spawn(job.run().instrument(span));

        Ok(Dispatched { repository, handle })
    }

    /// Number of jobs still running or reporting.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait up to `grace` for in-flight jobs. Returns `false` on timeout.
    ///
    /// Jobs still running when the grace period ends are left alone.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(grace, self.tracker.wait()).await.is_ok()
    }
}

impl RequestHandler for DispatchCoordinator {
    fn handle(&self, request: &[u8]) -> Vec<u8> {
        match self.dispatch(request) {
            // Dropping the handle detaches the job.
            Ok(dispatched) => acknowledgment(&dispatched.repository).into_bytes(),
            Err(e) => {
                let text = e.response_text();
                self.log.error(&text);
                text.into_bytes()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Background work
// ---------------------------------------------------------------------------

/// Everything one spawned job owns.
struct BackgroundJob {
    config: Config,
    spec: CommandSpec,
    executor: Arc<dyn JobExecutor>,
    sinks: Arc<dyn SinkProvider>,
    log: Arc<dyn DispatchLog>,
}

impl BackgroundJob {
    async fn run(self) -> DispatchOutcome {
        let result = self.executor.execute(&self.spec).await;

        if self.config.log {
            self.log.info(&format!("  Status: {}", result.status));
            self.log.info(&format!("  Stdout: {}", result.stdout_lossy()));
            self.log.info(&format!("  Stderr: {}", result.stderr_lossy()));
        }

        let failed = !result.succeeded();
        let send_notification = self.config.email.always || failed;
        let subject = subject_line(&result);

        let (archive, notify): (Vec<_>, Vec<_>) = self
            .sinks
            .sinks(&self.config)
            .await
            .into_iter()
            .partition(|sink| sink.kind() == SinkKind::Archive);

        let mut sink_failures = Vec::new();

        let mut artifact_url: Option<String> = None;
        for sink in &archive {
            let prior = artifact_url.clone();
            match self
                .deliver(sink.as_ref(), &result, &subject, prior.as_deref())
                .await
            {
                Ok(Some(url)) => {
                    artifact_url.get_or_insert(url);
                }
                Ok(None) => {}
                Err(failure) => sink_failures.push(failure),
            }
        }

        let mut notified = false;
        if send_notification {
            if notify.is_empty() && failed {
                self.log.warn(&format!(
                    "No notification sink configured; failure of {} reported in log only",
                    self.spec.label
                ));
            }
            for sink in &notify {
                notified = true;
                if let Err(failure) = self
                    .deliver(sink.as_ref(), &result, &subject, artifact_url.as_deref())
                    .await
                {
                    sink_failures.push(failure);
                }
            }
        }

        self.log_summary(&result);

        DispatchOutcome {
            repository: self.spec.label,
            status: result.status,
            duration: result.duration,
            artifact_url,
            notified,
            sink_failures,
        }
    }

    /// Run one sink, logging and flattening its error.
    async fn deliver(
        &self,
        sink: &dyn LogSink,
        result: &ExecutionResult,
        subject: &str,
        artifact_url: Option<&str>,
    ) -> Result<Option<String>, String> {
        let report = JobReport {
            result,
            subject,
            artifact_url,
        };
        sink.log(&report).await.map_err(|e| {
            self.log
                .error(&format!("ERROR logging to {}: {e}", sink.name()));
            format!("{}: {e}", sink.name())
        })
    }

    fn log_summary(&self, result: &ExecutionResult) {
        if result.succeeded() {
            self.log.info(&format!(
                "OK ran job for repository: {} - {}",
                self.spec.label, self.spec
            ));
        } else {
            let cause = result
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| result.status.to_string());
            self.log.error(&format!(
                "ERROR Executing job for repository: {} - {} - {} stdout: {} stderr: {}",
                self.spec.label,
                self.spec.program,
                cause,
                result.stdout_lossy(),
                result.stderr_lossy()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn response_text_names_the_error_code() {
        let err = DispatchError::from(ResolutionError::UnknownRepository("ghost".into()));
        assert_eq!(
            err.response_text(),
            "ERROR UnknownRepository: no job configured for repository: ghost"
        );

        let err = DispatchError::from(DecodeError::MissingPayload);
        assert_eq!(
            err.response_text(),
            "ERROR MissingPayload: request missing 'payload' param"
        );
    }

    #[test]
    fn decode_errors_convert() {
        let err: DispatchError = DecodeError::InvalidJson("eof".into()).into();
        assert_matches!(err, DispatchError::Decode(DecodeError::InvalidJson(_)));
        assert_eq!(err.code(), "InvalidJSON");
    }

    #[test]
    fn acknowledgment_names_repository() {
        assert_eq!(acknowledgment("repo1"), "Running job for repository: repo1");
    }
}
