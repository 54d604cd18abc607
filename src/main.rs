//! HTTP service entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clipstream::{AppState, Streamer, build_cors_layer, build_default_resolver_registry, router};
use tokio::net::TcpListener;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Clipstream starting");

    let config = args.app_config();
    let registry = Arc::new(build_default_resolver_registry(&config));
    debug!(?registry, "Resolver registry ready");
    let streamer = Streamer::from_config(Arc::clone(&registry), &config)
        .context("could not build the download streamer")?;
    let cors = build_cors_layer(&args.allowed_origins)?;

    let app = router(AppState::new(registry, streamer), cors);

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("could not listen on {}", args.bind))?;
    info!(address = %args.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Clipstream stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
