//! Node-level configuration

use serde::{Deserialize, Serialize};

/// Identity of this node as written into self-addressed routing entries.
///
/// When a request is dispatched to an external application server, the
/// produced route path ends with an entry pointing back at this node so
/// the chain can resume; that entry uses this host and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalNode {
    /// Host name or address of this node
    pub host: String,
    /// Port on which this node accepts traffic from trusted peers
    pub trusted_port: u16,
}

impl LocalNode {
    /// Create a node identity
    pub fn new(host: impl Into<String>, trusted_port: u16) -> Self {
        LocalNode {
            host: host.into(),
            trusted_port,
        }
    }
}
