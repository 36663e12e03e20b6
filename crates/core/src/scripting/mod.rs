//! Job execution.
//!
//! [`executor`] holds the result types and the [`JobExecutor`] seam;
//! [`subprocess`] launches jobs as local child processes.

pub mod executor;
pub mod subprocess;

pub use executor::{ExecutionResult, JobExecutor, JobStatus};
pub use subprocess::ProcessExecutor;
