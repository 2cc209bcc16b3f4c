use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling SIP values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid SIP URI
    #[error("Invalid SIP URI: {0}")]
    InvalidUri(String),

    /// Unsupported or unknown URI scheme
    #[error("Invalid URI scheme: {0}")]
    InvalidScheme(String),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}
