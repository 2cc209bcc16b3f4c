//! Trust boundary processing
//!
//! A trust boundary is a point in the topology where header data must be
//! removed because the next hop is not equally trusted.  The sensitive set
//! is the network-location assertion (P-Access-Network-Info) and the
//! served-user assertion (P-Served-User).

use std::fmt;

use tracing::debug;

use rims_sip_core::{HeaderName, SipMessage};

/// Strip headers as appropriate when crossing a trust boundary.
fn strip_trusted(msg: &mut SipMessage) {
    debug!("Strip trusted headers");
    msg.remove_header(&HeaderName::PAccessNetworkInfo);
    msg.remove_header(&HeaderName::PServedUser);
}

/// Strip/pass policy applied at a named trust boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustBoundary {
    description: &'static str,
    strip_request: bool,
    strip_response: bool,
}

impl TrustBoundary {
    /// No boundary
    pub const TRUSTED: TrustBoundary = TrustBoundary::new("TRUSTED", false, false);

    /// From client to core.  Allow the client to provide trusted data to
    /// the core, but don't allow it to see the core's internal data, so
    /// strip responses.
    pub const INBOUND_EDGE_CLIENT: TrustBoundary =
        TrustBoundary::new("INBOUND_EDGE_CLIENT", false, true);

    /// From core to client.  Allow the client to provide trusted data to
    /// the core, but don't allow it to see the core's internal data, so
    /// strip requests.
    pub const OUTBOUND_EDGE_CLIENT: TrustBoundary =
        TrustBoundary::new("OUTBOUND_EDGE_CLIENT", true, false);

    /// Edge processing of unknown direction.  Don't allow trusted data to
    /// pass either way.
    pub const UNKNOWN_EDGE_CLIENT: TrustBoundary =
        TrustBoundary::new("UNKNOWN_EDGE_CLIENT", true, true);

    /// From trunk to core.  Don't allow trusted data to pass either way.
    pub const INBOUND_TRUNK: TrustBoundary = TrustBoundary::new("INBOUND_TRUNK", true, true);

    /// From core to trunk.  Don't allow trusted data to pass either way.
    pub const OUTBOUND_TRUNK: TrustBoundary = TrustBoundary::new("OUTBOUND_TRUNK", true, true);

    const fn new(description: &'static str, strip_request: bool, strip_response: bool) -> Self {
        TrustBoundary {
            description,
            strip_request,
            strip_response,
        }
    }

    /// Apply this boundary's policy to an outgoing request
    pub fn process_request(&self, msg: &mut SipMessage) {
        if self.strip_request {
            strip_trusted(msg);
        }
    }

    /// Apply this boundary's policy to an outgoing response
    pub fn process_response(&self, msg: &mut SipMessage) {
        if self.strip_response {
            strip_trusted(msg);
        }
    }

    /// Strip both directions' sensitive headers from a message that
    /// bypasses transaction tracking, whatever the boundary
    pub fn process_stateless_message(msg: &mut SipMessage) {
        debug!("Strip trusted headers - stateless");
        strip_trusted(msg);
    }
}

impl fmt::Display for TrustBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{})",
            self.description,
            if self.strip_request { "-req" } else { "" },
            if self.strip_response { "-rsp" } else { "" },
        )
    }
}
