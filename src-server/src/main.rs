mod commands;
mod routes;
mod state;

use std::error::Error;
use std::sync::Arc;

use log::{error, info};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use bookscan::{load_config_from_env, LiveConnector};

use state::AppState;

/// Installs the fmt subscriber and routes `log` records through it.
fn init_tracing() -> Result<(), Box<dyn Error>> {
    LogTracer::init()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing()?;
    info!("Starting bookscan server v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config_from_env()?;
    let listen_addr = config.listen_addr.clone();
    let connector = Arc::new(LiveConnector::new(config.page_size, config.thumbnail_dpi));
    let state = AppState::new(config, connector);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Listening on {}", listen_addr);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
