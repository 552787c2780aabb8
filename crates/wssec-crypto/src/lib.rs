#![forbid(unsafe_code)]

//! Cryptographic providers for the wssec crates.
//!
//! Nothing here implements a primitive. Hashes, MACs, AES key wrap and RSA
//! key transport come from the RustCrypto crates; this crate maps algorithm
//! URIs onto them through an immutable [`AlgorithmRegistry`].

pub mod compare;
pub mod digest;
pub mod hash_stream;
pub mod keyed;
pub mod keytransport;
pub mod keywrap;
pub mod registry;

pub use compare::fixed_time_eq;
pub use digest::DigestAlgorithm;
pub use hash_stream::HashStream;
pub use keyed::KeyedHashAlgorithm;
pub use registry::{AlgorithmRegistry, CryptoProvider};
