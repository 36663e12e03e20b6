//! Job and sink configuration.
//!
//! The configuration file is JSON with PascalCase keys:
//!
//! ```json
//! {
//!   "Repositories": { "repo1": { "Dir": "/srv/repo1", "Script": ["$dir/build.sh", "--release"] } },
//!   "Aws":   { "Access": "", "Secret": "", "Bucket": "", "Region": "", "Acl": "", "Endpoint": "" },
//!   "Email": { "SmtpHost": "", "From": "", "To": [], "Always": false, "User": "", "Password": "" },
//!   "Log": false
//! }
//! ```
//!
//! Every section is optional. A [`ConfigSource`] is asked for a fresh
//! [`Config`] at the start of each dispatch, so edits to the file take effect
//! without a restart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default SMTP port when `SmtpHost` carries no explicit port.
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Region assumed when `Aws.Region` is empty.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Repository name → job definition.
pub type JobRegistry = BTreeMap<String, JobDefinition>;

/// Complete configuration as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    pub repositories: JobRegistry,
    pub aws: AwsConfig,
    pub email: EmailConfig,
    /// Write exit status, stdout and stderr of every run to the process log.
    pub log: bool,
}

/// A configured build job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobDefinition {
    /// Working directory for the job; empty means the daemon's own cwd.
    pub dir: String,
    /// Program followed by its arguments. The program may contain `$dir`.
    pub script: Vec<String>,
}

/// Object store sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AwsConfig {
    pub access: String,
    pub secret: String,
    pub bucket: String,
    pub region: String,
    /// Canned ACL applied when the bucket has to be created.
    pub acl: String,
    /// Custom endpoint for S3-compatible stores (path-style addressing).
    pub endpoint: String,
}

impl AwsConfig {
    /// The sink needs credentials and a bucket; anything less disables it.
    pub fn is_configured(&self) -> bool {
        !self.access.is_empty() && !self.secret.is_empty() && !self.bucket.is_empty()
    }

    pub fn region_or_default(&self) -> &str {
        if self.region.is_empty() {
            DEFAULT_AWS_REGION
        } else {
            &self.region
        }
    }
}

/// Email sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmailConfig {
    /// `host` or `host:port`.
    pub smtp_host: String,
    pub from: String,
    pub to: Vec<String>,
    /// Notify on every run, not only on failures.
    pub always: bool,
    pub user: String,
    pub password: String,
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty()
    }

    /// Split `SmtpHost` into host and port, defaulting to `localhost:25`.
    pub fn smtp_endpoint(&self) -> (String, u16) {
        let raw = self.smtp_host.trim();
        if raw.is_empty() {
            return ("localhost".to_string(), DEFAULT_SMTP_PORT);
        }
        match raw.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (raw.to_string(), DEFAULT_SMTP_PORT),
            },
            None => (raw.to_string(), DEFAULT_SMTP_PORT),
        }
    }

    /// Username and password, when both are set.
    pub fn credentials(&self) -> Option<(String, String)> {
        if self.user.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((self.user.clone(), self.password.clone()))
        }
    }
}

/// Supplies a fresh configuration for every dispatch.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<Config, ConfigError>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// Reads and parses a JSON file on every call.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<Config, ConfigError> {
        load_file(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A fixed in-memory configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    config: Config,
}

impl StaticConfigSource {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }

    fn describe(&self) -> String {
        "<static>".to_string()
    }
}

/// Read and parse a configuration file.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let data = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
