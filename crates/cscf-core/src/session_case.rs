//! The session case data type
//!
//! Whether a chain concerns an originating leg, a terminating leg, or a
//! diverted-originating leg (sescase; see RFC 5502 and 3GPP TS 29.228).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The session case of a service chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionCase {
    /// Originating leg
    Originating,
    /// Terminating leg
    Terminating,
    /// Originating leg after call diversion
    OriginatingCdiv,
}

impl SessionCase {
    /// The wire label used in the served-user assertion header
    pub fn as_str(&self) -> &str {
        match self {
            SessionCase::Originating => "orig",
            SessionCase::Terminating => "term",
            SessionCase::OriginatingCdiv => "orig-cdiv",
        }
    }

    /// True for Originating and OriginatingCdiv
    pub fn is_originating(&self) -> bool {
        matches!(
            self,
            SessionCase::Originating | SessionCase::OriginatingCdiv
        )
    }

    /// True for Terminating only
    pub fn is_terminating(&self) -> bool {
        matches!(self, SessionCase::Terminating)
    }
}

impl fmt::Display for SessionCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
