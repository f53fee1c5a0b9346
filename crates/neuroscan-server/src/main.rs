//! Server entry point: parse configuration, build the application context,
//! and serve the HTTP API.

mod api;
mod config;
mod error;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::config::Config;
use crate::state::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!("neuroscan v{}", env!("CARGO_PKG_VERSION"));

    let ctx = Arc::new(AppContext::from_config(&config).await?);
    let app = api::router(ctx);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("HTTP server listening on {}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
