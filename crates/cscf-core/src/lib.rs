//! # RIMS CSCF Core
//!
//! Application-server chaining for an IMS serving call-session control
//! function (S-CSCF): given a served user and their ordered initial filter
//! criteria, decide request by request which application server should see
//! the transaction next, produce the routing target that sends it there,
//! and resume the chain at the right position when an external server
//! returns the request.
//!
//! ## Architecture
//!
//! - [`aschain`]: the chain itself and [`AsChainLink`], the positional
//!   handle every client works through, with the per-step decision
//!   algorithm and the [`Disposition`] protocol
//! - [`table`]: the process-wide token-to-position lookup table used for
//!   out-of-band resumption
//! - [`ifc`]: the filter-criteria seam and served-user extraction
//! - [`services`]: the internal call-service dispatch seam
//! - [`target`]: the routing target value the proxy acts on
//! - [`trust`]: trust boundary header-stripping policy
//!
//! ## Chain processing
//!
//! The proxy obtains a link at position 0 from
//! [`AsChainLink::create_as_chain`] when a session starts, then calls
//! [`AsChainLink::on_initial_request`] per request and follows the
//! returned [`Disposition`]: `Stop` ends processing, `Skip` carries a
//! ready-made target for an external server, `Next` means advance and
//! re-evaluate, and `Complete` falls through to regular target
//! resolution.  When an external server sends the request back, the token
//! in its route identifies the continuation via
//! [`AsChainTable::lookup`].

pub mod aschain;
pub mod config;
pub mod error;
pub mod ifc;
pub mod services;
pub mod session_case;
pub mod table;
pub mod target;
pub mod trust;

pub use aschain::{AsChainLink, Disposition, TrailId, ODI_PREFIX};
pub use config::LocalNode;
pub use error::{ChainError, Result};
pub use ifc::{served_user_from_msg, AsInvocation, DefaultHandling, Ifc, Ifcs};
pub use services::{CallServices, ServiceFlavor};
pub use session_case::SessionCase;
pub use table::AsChainTable;
pub use target::Target;
pub use trust::TrustBoundary;
