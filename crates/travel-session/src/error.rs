//! Error types for session operations

/// Errors from session operations.
///
/// HTTP error statuses are not errors at the `execute` level: they come back
/// as a `Reply`. `Reply::error_for_status` converts them into `Status`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("invalid header value: {0}")]
    Header(String),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error(transparent)]
    Auth(#[from] travel_auth::Error),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
