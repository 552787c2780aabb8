#![forbid(unsafe_code)]

//! XML-Encryption structures as they appear in a WS-Security header.
//!
//! The types here only read and write XML and check structural rules
//! (element order, a single `CipherData`, homogeneous reference lists).
//! Decrypting payloads is left to the caller; unwrapping session keys
//! goes through [`WrappedKeySecurityToken`].

pub mod cipher;
pub mod context;
pub mod encrypted;
pub mod key_info;
pub mod method;
pub mod reference_list;
pub mod wrapped;

pub use cipher::CipherData;
pub use context::EncContext;
pub use encrypted::{EncryptedData, EncryptedKey, EncryptedReferences, EncryptedType, EncryptedTypeFields};
pub use key_info::KeyInfo;
pub use method::EncryptionMethod;
pub use reference_list::ReferenceList;
pub use wrapped::WrappedKeySecurityToken;
