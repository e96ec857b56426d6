//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::AppConfig;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid bind address '{addr}': {reason}")]
    Address { addr: String, reason: String },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Parse `http.host` and `http.port` into a socket address.
pub fn bind_address(config: &AppConfig) -> Result<SocketAddr, ServerError> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    addr.parse().map_err(|e: std::net::AddrParseError| ServerError::Address {
        reason: e.to_string(),
        addr,
    })
}

/// Start the HTTP server.
///
/// This function blocks until the server shuts down. Peer addresses are
/// exposed to handlers through `ConnectInfo<SocketAddr>`.
pub async fn start_server(app: Router, config: &AppConfig) -> Result<(), ServerError> {
    let addr = bind_address(config)?;
    let handle = Handle::new();

    tracing::info!(%addr, "Starting HTTP server");

    // Setup graceful shutdown
    shutdown::setup_shutdown_handler(handle.clone());

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
