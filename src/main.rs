//! otp-inbox server
//!
//! Loads the account list, then serves the dashboard and the latest-code
//! endpoint. Every request polls all mailboxes live.

use anyhow::{Context, Result};
use otp_inbox::{http, Aggregator, Config, ImapConnector, LogFormat};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str);

    let config_path = Config::resolve_path(cli_config_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    init_tracing(config.server.log_format);

    info!(
        path = %config_path.display(),
        accounts = config.accounts().len(),
        sender = %config.sender_filter,
        ttl_secs = config.code_ttl.as_secs(),
        "configuration loaded"
    );

    let listen_addr = config.server.listen_addr;
    let config = Arc::new(config);
    let aggregator = Arc::new(Aggregator::new(
        Arc::clone(&config),
        ImapConnector::new(config),
    ));

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;

    info!(%listen_addr, "listening");

    axum::serve(listener, http::build_router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

/// RUST_LOG wins; otherwise info for everything.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("otp_inbox=info,info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
