//! # RIMS SIP Core
//!
//! Minimal SIP value types for the RIMS signaling core: URIs, header names,
//! and a transaction-level message view.
//!
//! This crate deliberately does not implement the full SIP wire syntax.
//! It carries exactly the surface the service-chaining layer needs at its
//! seams: parsing and rendering of URIs (including the parameters that
//! matter for routing, `transport` and `lr`), canonical-form reduction of
//! user identities, and ordered header access on a message.
//!
//! ## Examples
//!
//! ```rust
//! use rims_sip_core::{Param, Uri};
//! use std::str::FromStr;
//!
//! let uri = Uri::from_str("sip:alice@example.com:5060;transport=tcp").unwrap();
//! assert_eq!(uri.username(), Some("alice"));
//! assert_eq!(uri.transport(), Some("tcp"));
//!
//! let uri = Uri::sip("example.com")
//!     .with_user("bob")
//!     .with_parameter(Param::Lr);
//! assert_eq!(uri.to_string(), "sip:bob@example.com;lr");
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use types::header::HeaderName;
pub use types::message::SipMessage;
pub use types::method::Method;
pub use types::uri::{Param, Scheme, Uri};
