use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use githook_api::config::{ServerConfig, Transport};
use githook_api::relay;
use githook_api::router::build_app;
use githook_api::shutdown;
use githook_api::state::AppState;
use githook_core::config::{ConfigSource, FileConfigSource};
use githook_core::scripting::ProcessExecutor;
use githook_events::ConfiguredSinks;
use githook_pipeline::DispatchCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "githook=info,tower_http=info".into()),
        )
        .with(fmt_layer)
        .init();

    // --- Configuration ---
    let config = ServerConfig::parse();
    let config_source = FileConfigSource::new(config.config.clone());
    tracing::info!(config = %config_source.describe(), "Loaded server configuration");

    // --- Dispatch ---
    let coordinator = DispatchCoordinator::new(
        Arc::new(config_source),
        Arc::new(ProcessExecutor),
        Arc::new(ConfiguredSinks),
    );

    match config.transport() {
        Transport::Relay { port, app } => {
            let ws = relay::connect(port, &app).await?;
            relay::run(ws, &coordinator, shutdown_signal(), config.shutdown_grace())
                .await
                .context("relay connection lost")?;
        }
        Transport::Http { bind } => {
            let app = build_app(
                AppState::new(Arc::new(coordinator.clone())),
                config.request_timeout(),
            );

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            tracing::info!(addr = %bind, "Starting server");

            let served = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await;

            // --- Post-shutdown cleanup ---
            shutdown::drain(&coordinator, config.shutdown_grace()).await;
            served.context("server error")?;
        }
    }

    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
