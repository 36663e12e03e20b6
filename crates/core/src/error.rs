//! Error taxonomy for the dispatch pipeline.
//!
//! Decode, configuration and resolution errors are the only failures a
//! webhook caller ever sees; they are rendered as `ERROR <code>: <message>`
//! by the coordinator. Execution errors travel inside an
//! [`ExecutionResult`](crate::scripting::executor::ExecutionResult) and are
//! only observable through the sinks and the process log.

use std::path::PathBuf;

/// The inbound request body could not be turned into a repository name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unable to parse request body: {0}")]
    MalformedQuery(String),

    #[error("request missing 'payload' param")]
    MissingPayload,

    #[error("unable to decode payload json: {0}")]
    InvalidJson(String),
}

impl DecodeError {
    /// Stable identifier used in caller-facing responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedQuery(_) => "MalformedQuery",
            Self::MissingPayload => "MissingPayload",
            Self::InvalidJson(_) => "InvalidJSON",
        }
    }
}

/// The repository could not be mapped to a runnable command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("no job configured for repository: {0}")]
    UnknownRepository(String),

    #[error("script not defined for repository: {0}")]
    EmptyScript(String),
}

impl ResolutionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownRepository(_) => "UnknownRepository",
            Self::EmptyScript(_) => "EmptyScript",
        }
    }
}

/// The configuration file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "ConfigUnreadable",
            Self::Parse { .. } => "ConfigInvalid",
        }
    }
}

/// Why a job run did not succeed.
///
/// Stored by value inside the execution result, so the underlying I/O
/// errors are flattened to their messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The process could not be started (missing executable, no permission).
    #[error("unable to launch {program}: {message}")]
    Launch { program: String, message: String },

    /// The process started but waiting on it failed.
    #[error("unable to wait on {program}: {message}")]
    Wait { program: String, message: String },

    /// The process ran to completion with a non-success status.
    #[error("{0}")]
    Exited(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_codes_are_stable() {
        assert_eq!(DecodeError::MalformedQuery("x".into()).code(), "MalformedQuery");
        assert_eq!(DecodeError::MissingPayload.code(), "MissingPayload");
        assert_eq!(DecodeError::InvalidJson("x".into()).code(), "InvalidJSON");
    }

    #[test]
    fn unknown_repository_display_names_the_repository() {
        let err = ResolutionError::UnknownRepository("ghost".to_string());
        assert_eq!(err.code(), "UnknownRepository");
        assert_eq!(err.to_string(), "no job configured for repository: ghost");
    }

    #[test]
    fn config_read_error_display_includes_path() {
        let err = ConfigError::Read {
            path: PathBuf::from("/etc/githook.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/etc/githook.json"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn execution_error_display_launch() {
        let err = ExecutionError::Launch {
            program: "/bin/nope".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unable to launch /bin/nope: No such file or directory"
        );
    }
}
