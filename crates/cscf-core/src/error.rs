use thiserror::Error;

/// A type alias for handling `Result`s with `ChainError`
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors raised by service-chain processing
#[derive(Error, Debug)]
pub enum ChainError {
    /// The filter criteria named an application server whose address does
    /// not parse.  The step's default handling has already been recorded on
    /// the link, so the caller can degrade exactly as if the server were
    /// unreachable.
    #[error("malformed application server URI '{server}': {source}")]
    MalformedServerUri {
        /// The server address as supplied by the filter criteria
        server: String,
        /// The underlying parse failure
        #[source]
        source: rims_sip_core::Error,
    },

    /// Resumption token generation kept colliding with registered tokens.
    /// This indicates a broken entropy source, not a normal runtime
    /// condition; chain creation must be aborted.
    #[error("resumption token space exhausted after {attempts} attempts")]
    TokenSpaceExhausted {
        /// How many candidates were drawn before giving up
        attempts: u32,
    },
}
