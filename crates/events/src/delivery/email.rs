//! Email notification delivery via SMTP.
//!
//! [`EmailSink`] wraps the `lettre` async SMTP transport to send plain-text
//! build reports to the configured recipients. STARTTLS is used when the
//! server offers it; credentials are sent only when both `User` and
//! `Password` are configured.

use githook_core::config::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::report::render_email_body;
use crate::sink::{JobReport, LogSink, SinkError, SinkKind};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailSink
// ---------------------------------------------------------------------------

/// Sends build reports by email.
#[derive(Debug, Clone)]
pub struct EmailSink {
    config: EmailConfig,
}

impl EmailSink {
    /// Build a sink, or `None` if the from-address or recipients are missing.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        config.is_configured().then(|| Self {
            config: config.clone(),
        })
    }

    /// Assemble the message for `report` without sending it.
    pub fn build_message(&self, report: &JobReport<'_>) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.config.from.parse::<Mailbox>()?)
            .subject(report.subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.config.to {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        builder
            .body(render_email_body(report.result, report.artifact_url))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    async fn send(&self, message: Message) -> Result<(), EmailError> {
        let (host, port) = self.config.smtp_endpoint();

        let tls = TlsParameters::new(host.clone())?;
        let mut transport_builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
            .port(port)
            .tls(Tls::Opportunistic(tls));

        if let Some((user, pass)) = self.config.credentials() {
            transport_builder = transport_builder.credentials(Credentials::new(user, pass));
        }

        let mailer = transport_builder.build();
        mailer.send(message).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LogSink for EmailSink {
    fn name(&self) -> &'static str {
        "email"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Notify
    }

    async fn log(&self, report: &JobReport<'_>) -> Result<Option<String>, SinkError> {
        let message = self.build_message(report)?;
        self.send(message).await?;

        tracing::info!(
            to = ?self.config.to,
            job = %report.result.job_label,
            "Build report email sent"
        );
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use githook_core::scripting::{ExecutionResult, JobStatus};

    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "localhost:2525".to_string(),
            from: "ci@example.com".to_string(),
            to: vec!["dev@example.com".to_string(), "ops@example.com".to_string()],
            ..Default::default()
        }
    }

    fn result() -> ExecutionResult {
        ExecutionResult {
            job_label: "repo1".to_string(),
            status: JobStatus::Success,
            stdout: b"ok".to_vec(),
            stderr: Vec::new(),
            duration: Duration::from_millis(5),
            error: None,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn disabled_without_from_or_recipients() {
        assert!(EmailSink::from_config(&EmailConfig::default()).is_none());
        let mut cfg = config();
        cfg.to.clear();
        assert!(EmailSink::from_config(&cfg).is_none());
        assert!(EmailSink::from_config(&config()).is_some());
    }

    #[test]
    fn message_has_subject_recipients_and_link() {
        let sink = EmailSink::from_config(&config()).expect("configured");
        let result = result();
        let report = JobReport {
            result: &result,
            subject: "Build passed for: repo1",
            artifact_url: Some("https://logs.example.com/repo1/a.log"),
        };
        let message = sink.build_message(&report).expect("build");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Subject: Build passed for: repo1"));
        assert!(raw.contains("dev@example.com"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("Full log: https://logs.example.com/repo1/a.log"));
    }

    #[test]
    fn invalid_recipient_is_address_error() {
        let mut cfg = config();
        cfg.to = vec!["not-an-email".to_string()];
        let sink = EmailSink::from_config(&cfg).expect("configured");
        let result = result();
        let report = JobReport {
            result: &result,
            subject: "s",
            artifact_url: None,
        };
        assert!(matches!(
            sink.build_message(&report),
            Err(EmailError::Address(_))
        ));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let mut cfg = config();
        cfg.smtp_host = "127.0.0.1:1".to_string();
        let sink = EmailSink::from_config(&cfg).expect("configured");
        let result = result();
        let report = JobReport {
            result: &result,
            subject: "s",
            artifact_url: None,
        };
        assert!(matches!(
            sink.log(&report).await,
            Err(SinkError::Email(EmailError::Transport(_)))
        ));
    }
}
