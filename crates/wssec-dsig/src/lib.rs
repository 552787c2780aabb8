#![forbid(unsafe_code)]

//! XML Digital Signature processing for WS-Security.
//!
//! Each `<ds:Reference>` of a `<ds:SignedInfo>` is wrapped in a
//! [`ReferenceWrapper`] that verifies its digest exactly once, when the
//! element it points at is visited.

pub mod context;
pub mod pool;
pub mod reference;
pub mod signed_info;
pub mod wrapper;

pub use context::DsigContext;
pub use pool::SignatureResourcePool;
pub use reference::Reference;
pub use signed_info::SignedInfo;
pub use wrapper::{
    DigestApplication, DigestSource, ReferenceTarget, ReferenceWrapper, VerificationState,
};
