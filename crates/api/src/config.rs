use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

/// Process configuration from command-line flags, with environment
/// fallbacks (a `.env` file is honoured).
///
/// | Flag | Env Var                       | Default         |
/// |------|-------------------------------|-----------------|
/// | `-r` | `GITHOOK_RELAY_PORT`          | `55555`         |
/// | `-a` | `GITHOOK_APP`                 | (empty)         |
/// | `-c` | `GITHOOK_CONFIG`              | `githook.json`  |
/// | `-h` | `GITHOOK_HTTP`                | `0.0.0.0:80`    |
/// |      | `GITHOOK_REQUEST_TIMEOUT_SECS`| `30`            |
/// |      | `GITHOOK_SHUTDOWN_GRACE_SECS` | `30`            |
#[derive(Parser, Debug, Clone)]
#[command(
    name = "githook",
    version,
    about = "Runs build jobs when repositories receive pushes",
    disable_help_flag = true
)]
pub struct ServerConfig {
    /// Port of the message relay.
    #[arg(short = 'r', long, env = "GITHOOK_RELAY_PORT", default_value_t = 55555)]
    pub relay_port: u16,

    /// Relay application name to register as. When set, the relay transport
    /// is used instead of HTTP.
    #[arg(short = 'a', long = "app", env = "GITHOOK_APP", default_value = "")]
    pub app: String,

    /// Job config file (JSON), re-read on every webhook delivery.
    #[arg(short = 'c', long, env = "GITHOOK_CONFIG", default_value = "githook.json")]
    pub config: PathBuf,

    /// HTTP bind address (`host:port` or `:port`).
    #[arg(short = 'h', long = "http", env = "GITHOOK_HTTP", default_value = "0.0.0.0:80")]
    pub http_bind: String,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "GITHOOK_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How long to wait for running jobs after a shutdown signal.
    #[arg(long, env = "GITHOOK_SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

/// Which listener the daemon runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Relay { port: u16, app: String },
    Http { bind: String },
}

impl ServerConfig {
    pub fn transport(&self) -> Transport {
        if self.app.is_empty() {
            Transport::Http {
                bind: normalize_bind(&self.http_bind),
            }
        } else {
            Transport::Relay {
                port: self.relay_port,
                app: self.app.clone(),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// `:8080` → `0.0.0.0:8080`; anything else is returned unchanged.
fn normalize_bind(bind: &str) -> String {
    if bind.starts_with(':') {
        format!("0.0.0.0{bind}")
    } else {
        bind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["githook"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn defaults_select_http() {
        let config = parse(&[]);
        assert_eq!(config.config, PathBuf::from("githook.json"));
        assert_eq!(config.relay_port, 55555);
        assert_eq!(
            config.transport(),
            Transport::Http {
                bind: "0.0.0.0:80".to_string()
            }
        );
        assert_eq!(config.shutdown_grace(), Duration::from_secs(30));
    }

    #[test]
    fn short_flags() {
        let config = parse(&["-c", "/etc/githook.json", "-h", ":8080"]);
        assert_eq!(config.config, PathBuf::from("/etc/githook.json"));
        assert_eq!(
            config.transport(),
            Transport::Http {
                bind: "0.0.0.0:8080".to_string()
            }
        );
    }

    #[test]
    fn app_name_selects_relay() {
        let config = parse(&["-a", "githook", "-r", "6000"]);
        assert_eq!(
            config.transport(),
            Transport::Relay {
                port: 6000,
                app: "githook".to_string()
            }
        );
    }

    #[test]
    fn long_help_is_still_available() {
        let err = ServerConfig::try_parse_from(["githook", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
