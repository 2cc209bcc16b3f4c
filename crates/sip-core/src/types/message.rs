//! Transaction-level SIP message view
//!
//! The full message representation (body, Via chain, wire framing) lives
//! with the transaction engine; this view carries what the service-chaining
//! layer inspects and mutates: the request line and the ordered header
//! list.

use serde::{Deserialize, Serialize};

use crate::types::header::HeaderName;
use crate::types::method::Method;
use crate::types::uri::Uri;

/// A SIP message as seen by the signaling core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipMessage {
    method: Method,
    uri: Uri,
    headers: Vec<(HeaderName, String)>,
}

impl SipMessage {
    /// Create a request with the given method and target URI
    pub fn request(method: Method, uri: Uri) -> Self {
        SipMessage {
            method,
            uri,
            headers: Vec::new(),
        }
    }

    /// The request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Replace the request target URI
    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    /// The value of the first header with the given name, if any
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for the given header name, in message order
    pub fn headers<'a>(&'a self, name: &'a HeaderName) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether any header with the given name is present
    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.iter().any(|(n, _)| n == name)
    }

    /// Append a header, preserving any existing values
    pub fn append_header(&mut self, name: HeaderName, value: impl Into<String>) {
        self.headers.push((name, value.into()));
    }

    /// Set a header to a single value, replacing every existing occurrence
    pub fn set_header(&mut self, name: HeaderName, value: impl Into<String>) {
        self.headers.retain(|(n, _)| n != &name);
        self.headers.push((name, value.into()));
    }

    /// Remove every occurrence of the given header; returns how many were
    /// removed
    pub fn remove_header(&mut self, name: &HeaderName) -> usize {
        let before = self.headers.len();
        self.headers.retain(|(n, _)| n != name);
        before - self.headers.len()
    }
}
