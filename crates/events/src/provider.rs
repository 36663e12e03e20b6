//! Per-dispatch sink construction.
//!
//! Sinks are rebuilt from the freshly loaded configuration on every
//! dispatch. A sink that is not configured, or whose setup fails, is simply
//! left out of the list for that run.

use githook_core::config::Config;

use crate::delivery::email::EmailSink;
use crate::delivery::object_store::ObjectStoreSink;
use crate::sink::LogSink;

/// Builds the sinks for one dispatch.
#[async_trait::async_trait]
pub trait SinkProvider: Send + Sync {
    async fn sinks(&self, config: &Config) -> Vec<Box<dyn LogSink>>;
}

/// Builds the object store and email sinks described by the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredSinks;

#[async_trait::async_trait]
impl SinkProvider for ConfiguredSinks {
    async fn sinks(&self, config: &Config) -> Vec<Box<dyn LogSink>> {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();

        if config.aws.is_configured() {
            match ObjectStoreSink::connect(&config.aws).await {
                Ok(sink) => sinks.push(Box::new(sink)),
                Err(e) => {
                    tracing::error!(bucket = %config.aws.bucket, error = %e, "Object store sink disabled");
                }
            }
        } else {
            tracing::info!("Object store sink not configured");
        }

        match EmailSink::from_config(&config.email) {
            Some(sink) => sinks.push(Box::new(sink)),
            None => tracing::info!("Email sink not configured"),
        }

        sinks
    }
}
