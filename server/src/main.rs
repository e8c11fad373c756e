//! xrate Binary
//!
//! Serves the FX rate and conversions over HTTP while keeping the rate warm
//! in the background.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use xrate_server::{logging, router, App, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    logging::init(&config).context("Failed to initialize logging")?;

    let listen_addr = config.listen_addr;
    info!(
        api_url = %config.rate.api_url,
        refresh_interval_ms = config.rate.refresh_interval.as_millis() as u64,
        "Starting xrate"
    );

    let app = Arc::new(App::from_config(config).context("Failed to build application")?);
    app.start()?;

    match app.warm_up().await {
        Ok(rate) => info!(rate = %rate, "Exchange rate cache warmed"),
        Err(e) => error!(
            error = %e,
            "Initial exchange rate refresh failed, will retry on schedule"
        ),
    }

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    info!(listen_addr = %listen_addr, "xrate listening");

    axum::serve(listener, router(app.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    app.stop().await;

    info!("xrate shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
}
