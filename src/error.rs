//! Unified error type.

use std::net::AddrParseError;

/// The error type returned by waypost's fallible operations.
///
/// Routing misses (404, 405) are expressed as HTTP responses, not as
/// `Error`s. This type surfaces infrastructure failures (binding, TLS
/// material) and the failures a [`Context`](crate::Context) write can
/// signal back to its handler.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid listen address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("tls: {0}")]
    Tls(#[source] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading response file: {0}")]
    FileRead(#[source] std::io::Error),
}

/// A failure raised by application code inside a handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
