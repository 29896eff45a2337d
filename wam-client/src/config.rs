//! Client configuration
//!
//! Defaults match what the speakers tolerate: connections are refused
//! quickly when a speaker is offline, and command replies usually arrive
//! within a couple of seconds.

use std::time::Duration;

use wam_api::DEFAULT_PORT;

use crate::error::{ClientError, Result};

/// Shortest request timeout accepted by [`ClientConfig::validate`]
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest request timeout accepted by [`ClientConfig::validate`]
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a [`crate::WamClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Speaker TCP port
    /// Default: 55001
    pub port: u16,

    /// Timeout for opening the listen connection and each command connection
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Base timeout for a reply, multiplied by the command's timeout multiple
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Bytes requested per read on the listen connection
    /// Default: 1024
    pub read_chunk_size: usize,

    /// Unframed bytes kept before the receive buffer is discarded
    /// Default: 1 MiB
    pub max_buffer_size: usize,

    /// Identity token sent as `mobileUUID`, echoed back in replies
    /// Default: random UUID
    pub user: String,

    /// Sent as `mobileName`
    /// Default: "Wireless Audio"
    pub client_name: String,

    /// Sent as `mobileVersion`
    /// Default: "1.0"
    pub client_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            read_chunk_size: 1024,
            max_buffer_size: 1024 * 1024,
            user: uuid::Uuid::new_v4().to_string(),
            client_name: "Wireless Audio".to_string(),
            client_version: "1.0".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        check_request_timeout(self.request_timeout)?;

        if self.connect_timeout.is_zero() {
            return Err(ClientError::Configuration(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        if self.read_chunk_size == 0 {
            return Err(ClientError::Configuration(
                "Read chunk size must be greater than 0".to_string(),
            ));
        }

        if self.max_buffer_size < self.read_chunk_size {
            return Err(ClientError::Configuration(
                "Max buffer size must be at least the read chunk size".to_string(),
            ));
        }

        if self.user.is_empty() {
            return Err(ClientError::Configuration("User token must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Reject request timeouts outside 5..=60 seconds
pub fn check_request_timeout(timeout: Duration) -> Result<()> {
    if timeout < MIN_REQUEST_TIMEOUT || timeout > MAX_REQUEST_TIMEOUT {
        return Err(ClientError::InvalidTimeout(timeout));
    }
    Ok(())
}
