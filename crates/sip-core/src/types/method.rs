//! SIP request methods

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// SIP request method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// INVITE - initiate a session
    Invite,
    /// ACK - acknowledge a final INVITE response
    Ack,
    /// BYE - terminate a session
    Bye,
    /// CANCEL - cancel a pending request
    Cancel,
    /// REGISTER - register a binding
    Register,
    /// OPTIONS - query capabilities
    Options,
    /// SUBSCRIBE - subscribe to an event package
    Subscribe,
    /// NOTIFY - event notification
    Notify,
    /// MESSAGE - instant message
    Message,
    /// Any other method
    Other(String),
}

impl Method {
    /// Returns the string representation of the method
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Options => "OPTIONS",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Message => "MESSAGE",
            Method::Other(name) => name,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_uppercase().as_str() {
            "INVITE" => Ok(Method::Invite),
            "ACK" => Ok(Method::Ack),
            "BYE" => Ok(Method::Bye),
            "CANCEL" => Ok(Method::Cancel),
            "REGISTER" => Ok(Method::Register),
            "OPTIONS" => Ok(Method::Options),
            "SUBSCRIBE" => Ok(Method::Subscribe),
            "NOTIFY" => Ok(Method::Notify),
            "MESSAGE" => Ok(Method::Message),
            other => Ok(Method::Other(other.to_string())),
        }
    }
}
