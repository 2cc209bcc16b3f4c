//! SIP header names
//!
//! Only the headers the signaling core reads or writes get their own
//! variant; everything else travels as [`HeaderName::Other`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of a SIP header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderName {
    /// From header
    From,
    /// To header
    To,
    /// Route header
    Route,
    /// P-Served-User header (RFC 5502) - served-user assertion
    PServedUser,
    /// P-Access-Network-Info header (RFC 3455) - network-location assertion
    PAccessNetworkInfo,
    /// Any other header
    Other(String),
}

impl HeaderName {
    /// Returns the canonical string representation of the header name
    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::From => "From",
            HeaderName::To => "To",
            HeaderName::Route => "Route",
            HeaderName::PServedUser => "P-Served-User",
            HeaderName::PAccessNetworkInfo => "P-Access-Network-Info",
            HeaderName::Other(name) => name,
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "from" => Ok(HeaderName::From),
            "to" => Ok(HeaderName::To),
            "route" => Ok(HeaderName::Route),
            "p-served-user" => Ok(HeaderName::PServedUser),
            "p-access-network-info" => Ok(HeaderName::PAccessNetworkInfo),
            _ => Ok(HeaderName::Other(s.to_string())),
        }
    }
}
