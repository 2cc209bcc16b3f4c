//! The AS chain data type
//!
//! An [`AsChain`] is the per-session record of which application servers
//! apply to a served user, in filter-criteria order.  Clients never hold an
//! `AsChain` directly; they work through [`AsChainLink`], a position within
//! a chain that also acts as an ownership handle: until a link is released,
//! the underlying chain stays alive.
//!
//! Links are obtained from [`AsChainLink::create_as_chain`] (position 0),
//! from [`AsChainTable::lookup`](crate::table::AsChainTable::lookup) when an
//! application server returns a request carrying a resumption token, or by
//! [`duplicate`](AsChainLink::duplicate).  The chain's owner tears the chain
//! down with [`request_destroy`](AsChainLink::request_destroy), exactly once.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, info};
use uuid::Uuid;

use rims_sip_core::{HeaderName, Param, SipMessage, Uri};

use crate::config::LocalNode;
use crate::error::{ChainError, Result};
use crate::ifc::{served_user_from_msg, DefaultHandling, Ifc, Ifcs};
use crate::services::{CallServices, ServiceFlavor};
use crate::session_case::SessionCase;
use crate::table::AsChainTable;
use crate::target::Target;

/// Prefix of the user part of self-addressed resumption route entries
pub const ODI_PREFIX: &str = "odi_";

/// Application server liveness timeouts (in seconds).  The more forgiving
/// handling mode gets the shorter timeout.
const AS_TIMEOUT_CONTINUE: u32 = 2;
const AS_TIMEOUT_TERMINATE: u32 = 4;

/// Opaque correlation identifier, passed through unmodified
pub type TrailId = u64;

/// The per-session application server chain.
///
/// Use [`AsChainLink`], not this type directly.
pub struct AsChain {
    id: Uuid,
    table: Weak<AsChainTable>,
    session_case: SessionCase,
    served_user: String,
    is_registered: bool,
    trail: TrailId,
    ifcs: Ifcs,
    /// Resumption tokens, one for each step
    odi_tokens: Vec<String>,
}

impl AsChain {
    pub(crate) fn new(
        table: Weak<AsChainTable>,
        session_case: SessionCase,
        served_user: String,
        is_registered: bool,
        trail: TrailId,
        ifcs: Ifcs,
        odi_tokens: Vec<String>,
    ) -> Self {
        AsChain {
            id: Uuid::new_v4(),
            table,
            session_case,
            served_user,
            is_registered,
            trail,
            ifcs,
            odi_tokens,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn session_case(&self) -> SessionCase {
        self.session_case
    }

    pub(crate) fn served_user(&self) -> &str {
        &self.served_user
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.is_registered
    }

    pub(crate) fn trail(&self) -> TrailId {
        self.trail
    }

    /// Number of steps in this chain
    pub(crate) fn size(&self) -> usize {
        self.ifcs.len()
    }

    pub(crate) fn ifc_at(&self, index: usize) -> Option<&dyn Ifc> {
        self.ifcs.get(index)
    }

    pub(crate) fn odi_token(&self, index: usize) -> Option<&str> {
        self.odi_tokens.get(index).map(String::as_str)
    }

    pub(crate) fn odi_tokens(&self) -> &[String] {
        &self.odi_tokens
    }

    /// Remove this chain from its table, as soon as practical.
    fn request_destroy(&self) {
        debug!("Removing AsChain {} from table", self.id.simple());
        if let Some(table) = self.table.upgrade() {
            table.unregister(self.id, &self.odi_tokens);
        }
    }

    /// Whether the given message has the same target as this chain.  Used
    /// to detect the orig-cdiv case.  Only valid for terminating chains.
    ///
    /// Alias URIs are not resolved (3GPP TS 24.229 s3.1), so this reduces
    /// to comparing canonical forms (s5.4.3.3 note 3: URI parameters
    /// removed, escapes decoded).
    fn matches_target(&self, msg: &SipMessage) -> bool {
        debug_assert!(
            self.session_case.is_terminating(),
            "matches_target is only valid on terminating chains"
        );
        if !self.session_case.is_terminating() {
            return false;
        }
        let msg_user = served_user_from_msg(SessionCase::Terminating, msg);
        msg_user.as_deref() == Some(self.served_user.as_str())
    }

    /// Served-user assertion header value, per RFC 5502 and the sescase
    /// extension in 3GPP TS 24.229 s7.2A.15.  The registration state is
    /// omitted for orig-cdiv chains.
    fn served_user_header_value(&self) -> String {
        let mut value = format!("<{}>;sescase={}", self.served_user, self.session_case);
        if self.session_case != SessionCase::OriginatingCdiv {
            value.push_str(";regstate=");
            value.push_str(if self.is_registered { "reg" } else { "unreg" });
        }
        value
    }

    fn to_string_at(&self, index: usize) -> String {
        format!(
            "AsChain-{}[{}]:{}/{}",
            self.session_case,
            self.id.simple(),
            index + 1,
            self.size()
        )
    }
}

impl Drop for AsChain {
    fn drop(&mut self) {
        debug!("Destroying AsChain {}", self.id.simple());
    }
}

/// Suggested handling of a request after evaluating one chain step
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// The request has been completely handled; processing should stop
    Stop,

    /// The request is being passed to an external application server;
    /// processing should skip to the produced target, omitting any
    /// subsequent target-resolution stages
    Skip(Target),

    /// There are no links left on the chain; processing should continue
    /// with the next stage
    Complete,

    /// Nothing to do at this link; processing should continue with the
    /// next link
    Next,
}

/// A single link in an [`AsChain`].
///
/// The link is both a position (step index) and a reference: a bound link
/// keeps its chain alive until [`release`](AsChainLink::release)d or
/// dropped.
pub struct AsChainLink {
    chain: Option<Arc<AsChain>>,
    index: usize,
    /// Failure policy recorded by the external-AS dispatch this link
    /// performed; meaningful only immediately after
    /// [`on_initial_request`](AsChainLink::on_initial_request) returned
    /// `Skip`.  Every newly constructed link starts at `SessionTerminate`.
    default_handling: DefaultHandling,
}

impl Default for AsChainLink {
    /// An unbound link
    fn default() -> Self {
        AsChainLink {
            chain: None,
            index: 0,
            default_handling: DefaultHandling::SessionTerminate,
        }
    }
}

impl AsChainLink {
    pub(crate) fn bound(chain: Arc<AsChain>, index: usize) -> Self {
        AsChainLink {
            chain: Some(chain),
            index,
            default_handling: DefaultHandling::SessionTerminate,
        }
    }

    /// Create a new chain and return a link pointing at the start of it.
    ///
    /// The chain's resumption tokens are generated and registered in the
    /// same critical section, one per step, each resolving to the position
    /// after the step that issued it.
    ///
    /// The caller MUST eventually both release this link (and any
    /// duplicates) and call [`request_destroy`](AsChainLink::request_destroy)
    /// once when finished with the underlying chain.
    pub fn create_as_chain(
        table: &Arc<AsChainTable>,
        session_case: SessionCase,
        served_user: impl Into<String>,
        is_registered: bool,
        trail: TrailId,
        ifcs: Ifcs,
    ) -> Result<AsChainLink> {
        let chain =
            AsChainTable::register(table, session_case, served_user.into(), is_registered, trail, ifcs)?;
        Ok(AsChainLink::bound(chain, 0))
    }

    /// Whether this link is bound to a chain
    pub fn is_set(&self) -> bool {
        self.chain.is_some()
    }

    /// Whether there is nothing left to do on this chain: the link is
    /// unbound, or its position is past the last step
    pub fn is_complete(&self) -> bool {
        match &self.chain {
            Some(chain) => self.index == chain.size(),
            None => true,
        }
    }

    /// Move to the next link in the chain.  Requires `!is_complete()`.
    ///
    /// This consumes the link: the returned value is the same ownership
    /// handle, one step further along.  The chain's reference count is
    /// unchanged.
    pub fn advance(self) -> AsChainLink {
        debug_assert!(!self.is_complete(), "advance past the end of the chain");
        let limit = self.chain.as_ref().map_or(0, |chain| chain.size());
        AsChainLink {
            index: (self.index + 1).min(limit),
            chain: self.chain,
            default_handling: DefaultHandling::SessionTerminate,
        }
    }

    /// Create a new reference to the underlying chain at the same
    /// position.  The caller must release the duplicate independently.
    pub fn duplicate(&self) -> AsChainLink {
        AsChainLink {
            chain: self.chain.clone(),
            index: self.index,
            default_handling: DefaultHandling::SessionTerminate,
        }
    }

    /// Caller has finished using this link.  A no-op on unbound links.
    pub fn release(self) {
        // Dropping the held Arc is the release.
    }

    /// Tear down the underlying chain: unregister its resumption tokens
    /// and drop the table's collective reference.  Call exactly once per
    /// chain.  The chain itself is freed when the last outstanding link
    /// releases it, which may be during this call.
    pub fn request_destroy(&self) {
        if let Some(chain) = &self.chain {
            chain.request_destroy();
        }
    }

    /// The session case of the bound chain
    pub fn session_case(&self) -> Option<SessionCase> {
        self.chain.as_ref().map(|chain| chain.session_case())
    }

    /// The served user of the bound chain
    pub fn served_user(&self) -> Option<&str> {
        self.chain.as_ref().map(|chain| chain.served_user())
    }

    /// Number of steps in the bound chain; 0 when unbound
    pub fn size(&self) -> usize {
        self.chain.as_ref().map_or(0, |chain| chain.size())
    }

    /// The trail identifier of the bound chain; 0 when unbound
    pub fn trail(&self) -> TrailId {
        self.chain.as_ref().map_or(0, |chain| chain.trail())
    }

    /// The resumption token that resolves to the position after this
    /// link's step
    pub fn next_odi_token(&self) -> Option<&str> {
        self.chain
            .as_ref()
            .and_then(|chain| chain.odi_token(self.index))
    }

    /// Whether the given message has the same target as the bound chain.
    /// Only valid for terminating chains.
    pub fn matches_target(&self, msg: &SipMessage) -> bool {
        self.chain
            .as_ref()
            .map_or(false, |chain| chain.matches_target(msg))
    }

    /// Failure policy for this link's external-AS dispatch.  If
    /// `SessionTerminate`, errors or timeouts from the AS fail the
    /// transaction; if `SessionContinue`, they continue with the next link.
    /// Read this immediately after
    /// [`on_initial_request`](AsChainLink::on_initial_request); links
    /// produced by `advance`, `duplicate`, or table lookup do not inherit
    /// it.
    pub fn default_handling(&self) -> DefaultHandling {
        self.default_handling
    }

    /// Reset the failure policy to `SessionTerminate`.  Call when the AS
    /// answers with a 100 Trying, which indicates it has received and is
    /// processing the transaction; from then on a failure from that AS is
    /// fatal to the transaction rather than a reason to fall through to
    /// the next link.
    pub fn reset_default_handling(&mut self) {
        self.default_handling = DefaultHandling::SessionTerminate;
    }

    /// Apply this link's step to an initial request.
    ///
    /// See 3GPP TS 23.218 s5.2/s6 for an overview and 3GPP TS 24.229
    /// s5.4.3.2 and s5.4.3.3 for the step-by-step behavior.
    ///
    /// A malformed application server address in the matched criteria is
    /// returned as an error after the step's failure policy has been
    /// recorded on this link, so the caller can treat it exactly like an
    /// unreachable server.
    pub fn on_initial_request(
        &mut self,
        services: Option<&dyn CallServices>,
        local: &LocalNode,
        msg: &mut SipMessage,
    ) -> Result<Disposition> {
        if self.is_complete() {
            debug!("No ASs left in chain");
            return Ok(Disposition::Complete);
        }

        // is_complete() above guarantees a bound chain and an in-range step.
        let chain = match self.chain.clone() {
            Some(chain) => chain,
            None => return Ok(Disposition::Complete),
        };
        let ifc = match chain.ifc_at(self.index) {
            Some(ifc) => ifc,
            None => return Ok(Disposition::Complete),
        };

        if !ifc.filter_matches(chain.session_case(), chain.is_registered(), msg) {
            debug!("No match for {}", self);
            return Ok(Disposition::Next);
        }

        let invocation = ifc.as_invocation();
        let odi_value = match self.next_odi_token() {
            Some(token) => format!("{ODI_PREFIX}{token}"),
            None => return Ok(Disposition::Complete),
        };

        if let Some(services) = services.filter(|s| s.is_internal(&invocation.server_name)) {
            let flavor = if chain.session_case().is_originating() {
                ServiceFlavor::Originating
            } else {
                ServiceFlavor::Terminating
            };
            info!("Invoke internal {} services for {}", flavor, self);
            let proceed = services.invoke(flavor, msg, chain.served_user());
            return Ok(if proceed {
                Disposition::Next
            } else {
                Disposition::Stop
            });
        }

        // Store the failure policy first: the caller needs it even when the
        // server address below fails to parse.
        self.default_handling = invocation.default_handling;

        let mut as_uri: Uri =
            invocation
                .server_name
                .parse()
                .map_err(|source| ChainError::MalformedServerUri {
                    server: invocation.server_name.clone(),
                    source,
                })?;

        info!(
            "Invoking external AS {} with token {} for {}",
            as_uri, odi_value, self
        );

        // Assert the served user, session case and registration state for
        // the AS, per RFC 5502 and 3GPP TS 24.229 s5.4.3.2 step 5 /
        // s5.4.3.3 step 4c.
        msg.set_header(HeaderName::PServedUser, chain.served_user_header_value());

        let mut target = Target::new(msg.uri().clone());
        target.liveness_timeout = match self.default_handling {
            DefaultHandling::SessionContinue => AS_TIMEOUT_CONTINUE,
            DefaultHandling::SessionTerminate => AS_TIMEOUT_TERMINATE,
        };

        // The AS address goes first, loose-routed, otherwise the headers
        // get mucked up.
        as_uri.set_loose_routing();

        // Below it, a route entry back to this node with the resumption
        // token as its user part.  Use the same transport as the AS, in
        // case it can only cope with one.
        let mut self_uri = Uri::sip(local.host.clone())
            .with_user(odi_value)
            .with_port(local.trusted_port);
        if let Some(transport) = as_uri.transport() {
            self_uri = self_uri.with_parameter(Param::transport(transport));
        }
        self_uri.set_loose_routing();

        target.paths = vec![as_uri, self_uri];

        // Stop processing the chain and send the request out to the AS.
        Ok(Disposition::Skip(target))
    }
}

impl fmt::Display for AsChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chain {
            Some(chain) => f.write_str(&chain.to_string_at(self.index)),
            None => f.write_str("None"),
        }
    }
}
