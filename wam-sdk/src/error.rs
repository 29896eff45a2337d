use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Client error: {0}")]
    ClientError(#[from] wam_client::ClientError),

    #[error("API error: {0}")]
    ApiError(#[from] wam_api::ApiError),

    #[error("State management error: {0}")]
    StateError(#[from] wam_state::StateError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The command is not available in the speaker's current mode
    #[error("{0} is not supported in this mode")]
    FeatureNotSupported(crate::Feature),

    /// A reply arrived but lacked the value asked for
    #[error("'{method}' reply carried no '{field}'")]
    UnexpectedReply { method: String, field: String },
}

impl SdkError {
    pub(crate) fn unexpected_reply(method: &str, field: &str) -> Self {
        Self::UnexpectedReply {
            method: method.to_string(),
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
