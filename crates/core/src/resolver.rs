//! Repository → command resolution.

use std::fmt;
use std::path::PathBuf;

use crate::config::JobRegistry;
use crate::error::ResolutionError;

/// Placeholder in the first script token replaced by the job's directory.
pub const DIR_PLACEHOLDER: &str = "$dir";

/// A fully resolved command, ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Label used in logs, subjects and object keys (the repository name).
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: PathBuf,
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Resolve `repository` against `registry`.
///
/// Only the first occurrence of `$dir` in the first script token is
/// substituted; arguments are passed through untouched.
pub fn resolve(registry: &JobRegistry, repository: &str) -> Result<CommandSpec, ResolutionError> {
    let job = registry
        .get(repository)
        .ok_or_else(|| ResolutionError::UnknownRepository(repository.to_string()))?;

    let (first, rest) = job
        .script
        .split_first()
        .ok_or_else(|| ResolutionError::EmptyScript(repository.to_string()))?;

    let program = first.replacen(DIR_PLACEHOLDER, &job.dir, 1);

    let working_directory = if job.dir.is_empty() {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        PathBuf::from(&job.dir)
    };

    Ok(CommandSpec {
        label: repository.to_string(),
        program,
        args: rest.to_vec(),
        working_directory,
    })
}
