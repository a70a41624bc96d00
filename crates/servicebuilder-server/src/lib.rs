//! HTTP endpoint for the scoring service builder.
//!
//! # Routes
//!
//! - `POST /compile`: multipart form with one or more `pojo` files and one
//!   `jar` file; responds with the packaged jar or a JSON error
//! - `GET /ping`: liveness probe
//! - `GET /health`: status and version

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use servicebuilder_core::{BuilderConfig, ServiceBuilder};

pub use error::{ServerError, ServerResult};
pub use routes::{AppState, create_router, outcome_response};

/// Default request body limit; uploads include the runtime jar.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 55000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    fn addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Validate the resource pack and serve until Ctrl+C.
pub async fn serve(builder_config: BuilderConfig, config: ServerConfig) -> ServerResult<()> {
    builder_config.resources.validate()?;
    tracing::info!(
        resources = %builder_config.resources.root()?.display(),
        "using resource pack"
    );

    let state = Arc::new(AppState {
        builder: ServiceBuilder::new(builder_config),
    });
    let app = create_router(state, config.max_upload_bytes);

    let addr = config.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!("Starting builder server at http://{}", addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 55000);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_invalid_address() {
        let config = ServerConfig {
            host: "not an address".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.addr(), Err(ServerError::InvalidAddress(_))));
    }
}
