//! SIP value types

pub mod header;
pub mod message;
pub mod method;
pub mod uri;

pub use header::HeaderName;
pub use message::SipMessage;
pub use method::Method;
pub use uri::{Param, Scheme, Uri};
