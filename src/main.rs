//! Zentral Provider
//!
//! Plugin binary: binds the plugin endpoint on a local address, prints the
//! handshake line on stdout and serves the host until it is stopped.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zentral_provider::{server, Provider};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Zentral Provider - Manage Zentral configuration as code
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Plugin endpoint bind address
    #[arg(long, env = "ZTL_PROVIDER_ADDR", default_value = "127.0.0.1:0")]
    addr: String,

    /// Zentral API request timeout in seconds
    #[arg(long, env = "ZTL_API_TIMEOUT", default_value = "60")]
    api_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    info!("Starting Zentral provider");
    info!("  Version: {}", zentral_provider::VERSION);
    info!("  API timeout: {}s", args.api_timeout_secs);

    let provider = Arc::new(Provider::new(Duration::from_secs(args.api_timeout_secs)));
    info!(
        "Catalog loaded: {} resources, {} data sources",
        provider.resource_types().count(),
        provider.data_source_types().count()
    );

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind plugin endpoint on {}", args.addr))?;
    let addr = listener.local_addr().context("Failed to read plugin endpoint address")?;

    // The host waits for this line before talking to us.
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", server::handshake_line(addr)).context("Failed to write handshake")?;
    stdout.flush().context("Failed to write handshake")?;

    server::serve(listener, provider, shutdown_signal())
        .await
        .context("Plugin endpoint error")?;

    info!("Provider shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=info", "tower=warn", "tower_http=info", "axum=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // stdout carries the handshake line
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
