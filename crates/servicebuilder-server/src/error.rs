//! Error types for the builder server.

use std::net::SocketAddr;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured host and port do not form a socket address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Could not bind the listener.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Pipeline error raised outside a request (e.g. startup validation).
    #[error("Core error: {0}")]
    Core(#[from] servicebuilder_core::Error),

    /// IO error while serving.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
