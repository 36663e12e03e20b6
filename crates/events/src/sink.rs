//! The [`LogSink`] capability shared by every result destination.

use githook_core::scripting::ExecutionResult;

use crate::delivery::email::EmailError;

/// When a sink runs within a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Persists the result on every run and may produce an artifact URL.
    /// Archive sinks run before notify sinks.
    Archive,
    /// Tells a human; only runs when the notification policy says so.
    Notify,
}

/// What a sink is asked to record.
#[derive(Debug, Clone, Copy)]
pub struct JobReport<'a> {
    pub result: &'a ExecutionResult,
    pub subject: &'a str,
    /// URL produced by an earlier archive sink in the same dispatch.
    pub artifact_url: Option<&'a str>,
}

/// Error type for sink delivery failures. Always recovered by the caller.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Bucket setup or upload failed.
    #[error("object store error: {0}")]
    ObjectStore(String),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// A destination for finished job results.
#[async_trait::async_trait]
pub trait LogSink: Send + Sync {
    /// Short name for log lines, e.g. `"s3"`.
    fn name(&self) -> &'static str;

    fn kind(&self) -> SinkKind;

    /// Record the report. Archive sinks return the artifact URL.
    async fn log(&self, report: &JobReport<'_>) -> Result<Option<String>, SinkError>;
}
