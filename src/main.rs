// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use clap::{Parser, Subcommand};
use dnscentral::{
    central::Central,
    config::CentralConfig,
    constants::TOKIO_WORKER_THREADS,
    context::RequestContext,
    metrics,
    notification::{dispatcher::NotificationDispatcher, handlers, transport::LocalTransport},
    storage::MemoryStorage,
};
use tracing::{debug, error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "dnscentral", version, about = "Multi-tenant DNS-as-a-service control plane")]
struct Cli {
    /// Path to the YAML configuration file; built-in defaults when omitted
    #[arg(short, long, env = "DNSCENTRAL_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, env = "RUST_LOG_FORMAT", default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the dispatcher and the metrics/health server until interrupted
    Serve,
    /// Push every zone to the backend once and print the reports
    SyncAll,
    /// Check backend and storage health once
    Ping,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_format);

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dnscentral")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

// Respects RUST_LOG (default info) and RUST_LOG_FORMAT / --log-format.
fn init_tracing(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CentralConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            info!("No configuration file given, using defaults");
            CentralConfig::default()
        }
    };
    let config = Arc::new(config);
    debug!(host = %config.host, backend = %config.backend_driver, "Configuration loaded");

    let transport = Arc::new(LocalTransport::with_topic(config.central_topic.clone()));
    let central = Arc::new(Central::from_config(
        Arc::clone(&config),
        Arc::new(MemoryStorage::new()),
        transport.clone(),
    )?);
    central
        .seed()
        .await
        .context("Failed to create configured servers and domains")?;

    match cli.command {
        Command::Serve => serve(config, central, transport).await,
        Command::SyncAll => {
            let reports = central.sync_all(&RequestContext::admin()).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            Ok(())
        }
        Command::Ping => {
            let report = central.ping(&RequestContext::admin()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.status {
                anyhow::bail!("{} is unhealthy", report.host);
            }
            Ok(())
        }
    }
}

async fn serve(
    config: Arc<CentralConfig>,
    central: Arc<Central>,
    transport: Arc<LocalTransport>,
) -> Result<()> {
    info!(host = %config.host, "Starting dnscentral");

    let handlers =
        handlers::from_config(&config.enabled_notification_handlers, &config, &central)?;
    let dispatcher = Arc::new(NotificationDispatcher::new(
        handlers,
        transport,
        central.backend(),
    ));
    dispatcher.start().await?;

    let addr: SocketAddr = config
        .metrics_bind_address
        .parse()
        .with_context(|| format!("Invalid metrics bind address '{}'", config.metrics_bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Serving /metrics and /healthz");

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(central);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    for recovered in dispatcher.stop().await {
        warn!(error = %recovered, "Error during shutdown");
    }
    info!("dnscentral stopped");
    result
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn healthz_handler(State(central): State<Arc<Central>>) -> impl IntoResponse {
    match central.ping(&RequestContext::admin()).await {
        Ok(report) => {
            let status = if report.status {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(serde_json::to_value(report).unwrap_or_default()))
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
