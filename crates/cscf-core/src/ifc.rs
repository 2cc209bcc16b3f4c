//! The filter-criteria seam
//!
//! Initial filter criteria (iFC) are evaluated against each request to
//! decide which application server, if any, applies at each chain step.
//! Parsing and evaluating the criteria themselves is the subscriber-data
//! layer's business; this module defines the contract the chain consumes,
//! plus served-user extraction from a message.

use serde::{Deserialize, Serialize};
use tracing::warn;

use rims_sip_core::{HeaderName, SipMessage, Uri};

use crate::session_case::SessionCase;

/// Per-server policy for what a failure or timeout from the application
/// server does to the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultHandling {
    /// Errors or timeouts from the AS continue the chain at the next step
    SessionContinue,
    /// Errors or timeouts from the AS fail the transaction
    SessionTerminate,
}

/// A matched criteria entry's description of the server to invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsInvocation {
    /// Address of the application server (or internal capability name)
    pub server_name: String,
    /// Failure policy for this server
    pub default_handling: DefaultHandling,
    /// Opaque service information forwarded to the server
    pub service_info: String,
    /// Whether to include the original REGISTER request body
    pub include_register_request: bool,
    /// Whether to include the REGISTER response body
    pub include_register_response: bool,
}

impl AsInvocation {
    /// Create an invocation for the given server with the given failure
    /// policy; the REGISTER-body options default to off.
    pub fn new(server_name: impl Into<String>, default_handling: DefaultHandling) -> Self {
        AsInvocation {
            server_name: server_name.into(),
            default_handling,
            service_info: String::new(),
            include_register_request: false,
            include_register_response: false,
        }
    }
}

/// A single initial filter criterion.
///
/// Implementations hold the parsed trigger-point expression and decide
/// whether it matches a message; the chain only asks the two questions
/// below.
pub trait Ifc: Send + Sync {
    /// Whether this criterion's trigger matches the given message
    fn filter_matches(
        &self,
        session_case: SessionCase,
        is_registered: bool,
        msg: &SipMessage,
    ) -> bool;

    /// The application server this criterion designates
    fn as_invocation(&self) -> AsInvocation;
}

/// The ordered filter criteria for one served user, owned by the chain
/// they drive.
pub struct Ifcs(Vec<Box<dyn Ifc>>);

impl Ifcs {
    /// Wrap an ordered criteria list
    pub fn new(list: Vec<Box<dyn Ifc>>) -> Self {
        Ifcs(list)
    }

    /// An empty criteria list
    pub fn empty() -> Self {
        Ifcs(Vec::new())
    }

    /// Number of criteria
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The criterion at the given position
    pub fn get(&self, index: usize) -> Option<&dyn Ifc> {
        self.0.get(index).map(|ifc| ifc.as_ref())
    }
}

impl From<Vec<Box<dyn Ifc>>> for Ifcs {
    fn from(list: Vec<Box<dyn Ifc>>) -> Self {
        Ifcs(list)
    }
}

/// Extract the served-user identity from a message, in canonical form.
///
/// For originating cases (including orig-cdiv) the identity comes from the
/// P-Served-User header (RFC 5502) when present and parseable, else from
/// the From header, per 3GPP TS 24.229 s5.4.3.2 step 1.  For the
/// terminating case it comes from the request URI (s5.4.3.3 step 1).
///
/// The extraction is purely syntactic: whether the identity is locally
/// served is for the caller to decide against its own domain data.
pub fn served_user_from_msg(session_case: SessionCase, msg: &SipMessage) -> Option<String> {
    let uri = if session_case.is_originating() {
        let from_psu = msg.header(&HeaderName::PServedUser).and_then(|value| {
            Uri::from_header_value(value)
                .map_err(|e| warn!("Unable to parse P-Served-User header '{}': {}", value, e))
                .ok()
        });
        from_psu.or_else(|| {
            msg.header(&HeaderName::From)
                .and_then(|value| Uri::from_header_value(value).ok())
        })?
    } else {
        msg.uri().clone()
    };
    Some(uri.canonical_form().to_string())
}
