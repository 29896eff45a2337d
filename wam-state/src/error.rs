//! Error types for wam-state

use crate::logging::LoggingError;
use crate::synchronizer::SubscriptionId;

/// Result type for wam-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur during state synchronization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Unsubscribing an id that was never registered or already removed
    #[error("{0} is not a registered subscriber")]
    UnknownSubscriber(SubscriptionId),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}
