//! Error types for the wam-client crate

use std::time::Duration;

/// Errors raised by the connection manager and the request multiplexer
///
/// Transport errors end the current connection. [`ClientError::Timeout`]
/// only ends one request; the connection stays usable.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Already trying to connect")]
    AlreadyConnecting,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Waiting for speaker to disconnect")]
    Disconnecting,

    /// A request was issued without an active listen connection
    #[error("Not connected to speaker")]
    NotConnected,

    #[error("Timed out connecting to {address} after {timeout:?}")]
    ConnectionTimeout { address: String, timeout: Duration },

    /// Connection refused or dropped
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure writing a command
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No matching reply arrived in time
    #[error("No '{method}' reply within {waited:?}")]
    Timeout { method: String, waited: Duration },

    #[error("Request timeout {0:?} is outside 5..=60 seconds")]
    InvalidTimeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// True for an exhausted reply wait, which is safe to retry without reconnecting
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }

    /// True for failures that ended the connection
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionTimeout { .. } | ClientError::Connection(_) | ClientError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
