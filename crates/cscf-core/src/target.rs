//! Calculated routing targets

use serde::{Deserialize, Serialize};

use rims_sip_core::Uri;

/// Short-lived description of where a request should be sent next.
///
/// Produced per step and consumed immediately by the proxy; retry and
/// backoff against an unreachable target are the proxy's business, driven
/// by [`liveness_timeout`](Target::liveness_timeout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Whether this target came from the registration store rather than a
    /// service chain
    pub from_store: bool,
    /// Whether the request should be routed upstream rather than directly
    pub upstream_route: bool,
    /// Address-of-record the target was derived from, when from the store
    pub aor: String,
    /// Binding identifier within the address-of-record, when from the store
    pub binding_id: String,
    /// Next-hop request target
    pub uri: Uri,
    /// Intermediate routing addresses to insert, most-specific first
    pub paths: Vec<Uri>,
    /// Seconds to wait before considering the target unreachable
    pub liveness_timeout: u32,
}

impl Target {
    /// Create a target for the given destination with no paths and no
    /// store provenance
    pub fn new(uri: Uri) -> Self {
        Target {
            from_store: false,
            upstream_route: false,
            aor: String::new(),
            binding_id: String::new(),
            uri,
            paths: Vec::new(),
            liveness_timeout: 0,
        }
    }
}
