//! Error types.
//!
//! ERROR HANDLING
//! ==============
//! Only startup can fail the process. Everything that goes wrong once peers
//! are connected is per-connection: a failed send to one peer is reported as
//! a `SendError`, logged, and never propagated past the forwarder.

use std::io;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ping interval must be at least 1 second")]
    ZeroPingInterval,
    #[error("outbound queue capacity must be at least 1")]
    ZeroOutboundCapacity,
    #[error("invalid bind address `{0}`")]
    InvalidBindAddr(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("server failed: {0}")]
    Serve(#[source] io::Error),
}

/// Why a payload could not be queued for one destination peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("peer outbound queue is full")]
    Full,
    #[error("peer outbound queue is closed")]
    Closed,
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for SendError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => Self::Full,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}
