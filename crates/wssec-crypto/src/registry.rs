#![forbid(unsafe_code)]

//! The algorithm registry.
//!
//! A registry is built once, never mutated, and handed to the components
//! that need it. Lookups are closed `match`es over the URIs the crates
//! implement; a registry can only narrow that set.

use crate::digest::DigestAlgorithm;
use crate::keyed::KeyedHashAlgorithm;
use crate::keytransport::{KeyTransportAlgorithm, OaepParams};
use crate::keywrap::KeyWrapAlgorithm;
use wssec_core::{algorithm, Error, Result};

/// Creates hash algorithm instances by URI.
pub trait CryptoProvider: Send + Sync {
    fn create_hash_algorithm(&self, uri: &str) -> Result<Box<dyn DigestAlgorithm>>;

    fn create_keyed_hash_algorithm(
        &self,
        key: &[u8],
        uri: &str,
    ) -> Result<Box<dyn KeyedHashAlgorithm>>;
}

/// The set of algorithms a deployment accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmRegistry {
    digests: Vec<&'static str>,
    keyed_hashes: Vec<&'static str>,
    key_wraps: Vec<&'static str>,
    key_transports: Vec<&'static str>,
}

const ALL_DIGESTS: [&str; 4] = [
    algorithm::SHA1,
    algorithm::SHA256,
    algorithm::SHA384,
    algorithm::SHA512,
];

impl AlgorithmRegistry {
    /// Every algorithm implemented by this crate.
    pub fn standard() -> Self {
        Self {
            digests: ALL_DIGESTS.to_vec(),
            keyed_hashes: vec![
                algorithm::HMAC_SHA1,
                algorithm::HMAC_SHA256,
                algorithm::HMAC_SHA384,
                algorithm::HMAC_SHA512,
            ],
            key_wraps: vec![algorithm::KW_AES128, algorithm::KW_AES192, algorithm::KW_AES256],
            key_transports: vec![algorithm::RSA_PKCS1, algorithm::RSA_OAEP],
        }
    }

    /// The standard registry restricted to the given digest URIs.
    pub fn with_digests(uris: &[&str]) -> Result<Self> {
        let mut digests = Vec::with_capacity(uris.len());
        for uri in uris {
            let known = ALL_DIGESTS
                .iter()
                .find(|d| *d == uri)
                .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}")))?;
            digests.push(*known);
        }
        Ok(Self {
            digests,
            ..Self::standard()
        })
    }

    pub fn is_digest_supported(&self, uri: &str) -> bool {
        self.digests.iter().any(|d| *d == uri)
    }

    fn ensure(list: &[&'static str], kind: &str, uri: &str) -> Result<()> {
        if list.iter().any(|d| *d == uri) {
            Ok(())
        } else {
            tracing::debug!(kind, uri, "algorithm not enabled in registry");
            Err(Error::UnsupportedAlgorithm(format!("{kind}: {uri}")))
        }
    }

    pub fn key_wrap(&self, uri: &str) -> Result<Box<dyn KeyWrapAlgorithm>> {
        Self::ensure(&self.key_wraps, "key wrap", uri)?;
        crate::keywrap::from_uri(uri)
    }

    pub fn key_transport(
        &self,
        uri: &str,
        params: OaepParams,
    ) -> Result<Box<dyn KeyTransportAlgorithm>> {
        Self::ensure(&self.key_transports, "key transport", uri)?;
        crate::keytransport::from_uri_with_params(uri, params)
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CryptoProvider for AlgorithmRegistry {
    fn create_hash_algorithm(&self, uri: &str) -> Result<Box<dyn DigestAlgorithm>> {
        Self::ensure(&self.digests, "digest algorithm", uri)?;
        crate::digest::from_uri(uri)
    }

    fn create_keyed_hash_algorithm(
        &self,
        key: &[u8],
        uri: &str,
    ) -> Result<Box<dyn KeyedHashAlgorithm>> {
        Self::ensure(&self.keyed_hashes, "keyed hash algorithm", uri)?;
        crate::keyed::from_uri(key, uri)
    }
}
