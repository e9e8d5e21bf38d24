//! HTTP server command handler.

use std::net::SocketAddr;

use color_eyre::Result;

use crate::api;
use crate::config::Config;
use crate::context::Context;

use super::App;

impl App {
    /// Run the HTTP API until the process is stopped.
    pub async fn run_serve(&self, host: Option<String>, port: Option<u16>) -> Result<()> {
        tracing::info!("Starting risk-insights HTTP server");

        let config = Config::load_with_dotenv()?;
        let host = host.unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);

        if config.server.api_key.is_some() {
            tracing::info!("API key authentication enabled");
        } else {
            tracing::warn!("No API key configured - server is unprotected!");
        }

        let ctx = Context::from(config).await?;
        let app = api::router(ctx);

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid address {}:{}: {}", host, port, e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to bind to {}: {}", addr, e))?;

        tracing::info!("risk-insights listening on http://{}", addr);

        axum::serve(listener, app).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            color_eyre::eyre::eyre!("HTTP server error: {}", e)
        })?;

        tracing::info!("HTTP server shutting down");
        Ok(())
    }
}
