//! # SIP URI Implementation
//!
//! A reduced SIP URI as used for routing decisions: scheme, optional user,
//! host, optional port, and `;key=value` parameters.  See
//! [RFC 3261](https://tools.ietf.org/html/rfc3261) for the full grammar;
//! this crate carries only the subset the signaling core reads and writes.
//!
//! ## Usage Examples
//!
//! ```rust
//! use rims_sip_core::{Param, Uri};
//! use std::str::FromStr;
//!
//! // Parse a URI from a string
//! let uri = Uri::from_str("sip:alice@example.com:5060;transport=udp").unwrap();
//! assert_eq!(uri.username(), Some("alice"));
//! assert_eq!(uri.port, Some(5060));
//! assert_eq!(uri.transport(), Some("udp"));
//!
//! // Create a URI programmatically
//! let uri = Uri::sip("example.com")
//!     .with_user("bob")
//!     .with_port(5060)
//!     .with_parameter(Param::transport("tcp"));
//! assert_eq!(uri.to_string(), "sip:bob@example.com:5060;transport=tcp");
//! ```

use std::fmt;
use std::str::FromStr;

use nom::combinator::all_consuming;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::parse_uri;

/// SIP URI scheme types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// SIP URI (non-secure)
    Sip,
    /// SIPS URI (secure SIP)
    Sips,
    /// TEL URI (telephone number)
    Tel,
}

impl Scheme {
    /// Returns the string representation of the scheme
    pub fn as_str(&self) -> &str {
        match self {
            Scheme::Sip => "sip",
            Scheme::Sips => "sips",
            Scheme::Tel => "tel",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sip" => Ok(Scheme::Sip),
            "sips" => Ok(Scheme::Sips),
            "tel" => Ok(Scheme::Tel),
            _ => Err(Error::InvalidScheme(s.to_string())),
        }
    }
}

/// A URI parameter (`;key` or `;key=value`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    /// Transport parameter, e.g. `;transport=tcp`
    Transport(String),
    /// Loose-routing marker, `;lr`
    Lr,
    /// User parameter, e.g. `;user=phone`
    User(String),
    /// Any other parameter with an optional value
    Other(String, Option<String>),
}

impl Param {
    /// Convenience constructor for a transport parameter
    pub fn transport(value: impl Into<String>) -> Self {
        Param::Transport(value.into())
    }

    /// Build a parameter from a raw key and optional value
    pub fn from_key_value(key: &str, value: Option<&str>) -> Self {
        match (key.to_lowercase().as_str(), value) {
            ("transport", Some(v)) => Param::Transport(v.to_string()),
            ("lr", None) => Param::Lr,
            ("user", Some(v)) => Param::User(v.to_string()),
            (_, v) => Param::Other(key.to_string(), v.map(str::to_string)),
        }
    }

    /// The parameter key
    pub fn key(&self) -> &str {
        match self {
            Param::Transport(_) => "transport",
            Param::Lr => "lr",
            Param::User(_) => "user",
            Param::Other(key, _) => key,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Transport(value) => write!(f, "transport={value}"),
            Param::Lr => write!(f, "lr"),
            Param::User(value) => write!(f, "user={value}"),
            Param::Other(key, Some(value)) => write!(f, "{key}={value}"),
            Param::Other(key, None) => write!(f, "{key}"),
        }
    }
}

/// A SIP URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    /// URI scheme
    pub scheme: Scheme,
    /// Optional user part
    pub user: Option<String>,
    /// Host (domain name or IPv4 literal)
    pub host: String,
    /// Optional port
    pub port: Option<u16>,
    /// URI parameters, in order of appearance
    pub params: Vec<Param>,
}

impl Uri {
    /// Create a plain `sip:` URI for the given host
    pub fn sip(host: impl Into<String>) -> Self {
        Uri {
            scheme: Scheme::Sip,
            user: None,
            host: host.into(),
            port: None,
            params: Vec::new(),
        }
    }

    /// Set the user part
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Append a parameter
    pub fn with_parameter(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// The user part, if any
    pub fn username(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The transport parameter value, if any
    pub fn transport(&self) -> Option<&str> {
        self.params.iter().find_map(|p| match p {
            Param::Transport(value) => Some(value.as_str()),
            _ => None,
        })
    }

    /// Whether this URI carries the `lr` parameter
    pub fn is_loose_routing(&self) -> bool {
        self.params.iter().any(|p| matches!(p, Param::Lr))
    }

    /// Mark this URI for loose routing
    pub fn set_loose_routing(&mut self) {
        if !self.is_loose_routing() {
            self.params.push(Param::Lr);
        }
    }

    /// Reduce to canonical form: all URI parameters (including the user
    /// parameter) and the port are removed, and escaped characters in the
    /// user part are converted to unescaped form.  Per 3GPP TS 24.229
    /// s5.4.3.3, this is the form used when comparing served-user
    /// identities.  No alias resolution is performed.
    pub fn canonical_form(&self) -> Uri {
        Uri {
            scheme: self.scheme,
            user: self.user.as_deref().map(percent_decode),
            host: self.host.clone(),
            port: None,
            params: Vec::new(),
        }
    }

    /// Extract the URI from a header value holding a name-addr or
    /// addr-spec, e.g. `"Alice" <sip:alice@example.com>;tag=1` or
    /// `sip:alice@example.com`.  Header parameters after a bare addr-spec
    /// are ignored.
    pub fn from_header_value(value: &str) -> Result<Self> {
        let value = value.trim();
        let spec = if let Some(open) = value.find('<') {
            let rest = &value[open + 1..];
            match rest.find('>') {
                Some(close) => &rest[..close],
                None => return Err(Error::InvalidHeader(value.to_string())),
            }
        } else {
            value.split(';').next().unwrap_or(value)
        };
        spec.trim().parse()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        for param in &self.params {
            write!(f, ";{param}")?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match all_consuming(parse_uri)(s) {
            Ok((_, uri)) => Ok(uri),
            Err(_) => Err(Error::InvalidUri(s.to_string())),
        }
    }
}

/// Decode `%XX` escapes; malformed escapes are passed through literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
