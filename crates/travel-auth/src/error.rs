//! Error types for token storage and token endpoint calls

/// Errors from token operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("token store parse error: {0}")]
    StoreParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid URL: {0}")]
    Url(String),
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
