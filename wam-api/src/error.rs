use thiserror::Error;

/// Errors raised while building commands or translating values for a speaker
///
/// Decoding failures of device messages never surface here; they become
/// error envelopes instead (see [`crate::Envelope::decode`]).
#[derive(Debug, Error)]
pub enum ApiError {
    /// A parameter value is outside the range the device accepts
    #[error("Parameter '{parameter}' value '{value}' is out of range ({min}..={max})")]
    RangeError {
        parameter: String,
        value: String,
        min: String,
        max: String,
    },

    /// A parameter value is not one the device understands
    #[error("Parameter '{parameter}' value '{value}' is invalid: {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },

    /// The requested source is not available on this model
    #[error("Source '{0}' is not supported by this speaker")]
    UnknownSource(String),
}

impl ApiError {
    pub fn range_error(
        parameter: &str,
        min: impl std::fmt::Display,
        max: impl std::fmt::Display,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::RangeError {
            parameter: parameter.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn invalid_value(parameter: &str, value: impl std::fmt::Display, reason: &str) -> Self {
        Self::InvalidValue {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
