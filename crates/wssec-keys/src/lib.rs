#![forbid(unsafe_code)]

//! Security tokens and the clauses that identify them.
//!
//! A token is whatever a `KeyInfo` points at: a symmetric key, an RSA key
//! pair with an optional certificate, or (in `wssec-enc`) a key that is
//! itself still wrapped. Tokens are matched against
//! [`KeyIdentifierClause`]s and, when they can encrypt other keys,
//! implement [`KeyWrappingToken`].

pub mod clause;
pub mod rsa_token;
pub mod serializer;
pub mod symmetric;
pub mod token;

pub use clause::{KeyIdentifierClause, KeyIdentifierClauseKind};
pub use rsa_token::{CertificateValidator, RsaSecurityToken};
pub use serializer::{KeyIdentifierSerializer, StandardKeyIdentifierSerializer};
pub use symmetric::SymmetricSecurityToken;
pub use token::{KeyWrapMethod, KeyWrappingToken, SecurityToken};
