use thiserror::Error;

/// Errors from object-diff API calls.
///
/// Every variant is a transport failure from the poller's point of view.
/// "Still computing" is not an error and never shows up here; see
/// [`crate::StructurePoll::Pending`] and [`crate::NodePoll::Pending`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, or timeout failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx body that is not the JSON shape we expect.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_timeout())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
