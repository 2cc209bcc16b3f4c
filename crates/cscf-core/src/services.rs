//! Internal call-service dispatch seam
//!
//! Some filter criteria designate a capability implemented inside this
//! node rather than an external network address.  The chain stays agnostic
//! to what those services do; it only asks whether a server name is
//! internal and, if so, invokes the flavor matching the session direction.

use std::fmt;

use serde::{Deserialize, Serialize};

use rims_sip_core::SipMessage;

/// Which flavor of internal service applies, chosen by session direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceFlavor {
    /// Services applied on behalf of the caller
    Originating,
    /// Services applied on behalf of the callee
    Terminating,
}

impl fmt::Display for ServiceFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFlavor::Originating => write!(f, "originating"),
            ServiceFlavor::Terminating => write!(f, "terminating"),
        }
    }
}

/// Locally-implemented call services
pub trait CallServices: Send + Sync {
    /// Whether the given server name is an internal capability of this
    /// node rather than an external application server address
    fn is_internal(&self, server_name: &str) -> bool;

    /// Apply the service to the message in place, on behalf of the served
    /// user.  Returns whether chain processing should continue with the
    /// next step.
    fn invoke(&self, flavor: ServiceFlavor, msg: &mut SipMessage, served_user: &str) -> bool;
}
