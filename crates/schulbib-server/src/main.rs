//! Schulbib Server Binary

use std::sync::Arc;

use schulbib_server::{config::ServerConfig, serve, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::from_config(&config)?);

    serve(&config.addr, state).await
}
