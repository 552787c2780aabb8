#![forbid(unsafe_code)]

//! WS-Security signed and encrypted XML, re-exported from its crates.

pub use wssec_c14n as c14n;
pub use wssec_core as core;
pub use wssec_crypto as crypto;
pub use wssec_dsig as dsig;
pub use wssec_enc as enc;
pub use wssec_keys as keys;
pub use wssec_transforms as transforms;
pub use wssec_xml as xml;

pub use wssec_core::{Error, ErrorKind, Result};
