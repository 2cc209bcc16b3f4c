//! Parsers for the SIP values this crate models

pub mod uri;

pub use uri::parse_uri;
