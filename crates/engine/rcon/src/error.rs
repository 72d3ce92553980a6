//! Remote console error types.

use thiserror::Error;

/// Errors raised by the remote console transport.
#[derive(Debug, Error)]
pub enum RconError {
    /// Connection failed to establish or was reset.
    #[error("connection error: {0}")]
    Connection(String),

    /// The remote console rejected the shared secret. Fatal, never retried.
    #[error("authentication rejected by the remote console")]
    Auth,

    /// No response arrived within the per-attempt deadline.
    #[error("request timed out")]
    Timeout,

    /// The peer violated the wire protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for transport operations.
pub type RconResult<T> = Result<T, RconError>;
