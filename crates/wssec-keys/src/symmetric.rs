#![forbid(unsafe_code)]

//! Symmetric key tokens.

use crate::token::{KeyWrapMethod, KeyWrappingToken, SecurityToken};
use std::sync::Arc;
use wssec_core::{Error, Result};
use wssec_crypto::AlgorithmRegistry;
use zeroize::Zeroizing;

/// A shared secret key, usable as an AES key-encrypting key.
pub struct SymmetricSecurityToken {
    id: String,
    name: Option<String>,
    key: Zeroizing<Vec<u8>>,
    registry: Arc<AlgorithmRegistry>,
}

impl SymmetricSecurityToken {
    pub fn new(id: impl Into<String>, key: Vec<u8>) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("symmetric key is empty".into()));
        }
        Ok(Self {
            id: id.into(),
            name: None,
            key: Zeroizing::new(key),
            registry: Arc::new(AlgorithmRegistry::standard()),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_registry(mut self, registry: Arc<AlgorithmRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn key_size(&self) -> usize {
        self.key.len()
    }
}

impl std::fmt::Debug for SymmetricSecurityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricSecurityToken")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &format_args!("{} bytes", self.key.len()))
            .finish()
    }
}

impl SecurityToken for SymmetricSecurityToken {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl KeyWrappingToken for SymmetricSecurityToken {
    fn is_supported_wrap_algorithm(&self, algorithm: &str) -> bool {
        self.registry
            .key_wrap(algorithm)
            .map_or(false, |kw| kw.kek_size() == self.key.len())
    }

    fn wrap_key(&self, method: &KeyWrapMethod, key: &[u8]) -> Result<Vec<u8>> {
        let kw = self.registry.key_wrap(&method.algorithm)?;
        kw.wrap(&self.key, key)
    }

    fn unwrap_key(&self, method: &KeyWrapMethod, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let kw = self.registry.key_wrap(&method.algorithm)?;
        kw.unwrap(&self.key, wrapped).map(Zeroizing::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssec_core::algorithm;

    // RFC 3394 section 4.1.
    const KEK: &str = "000102030405060708090a0b0c0d0e0f";
    const KEY: &str = "00112233445566778899aabbccddeeff";
    const WRAPPED: &str = "1fa68b0a8112b447aef34bd8fb5a7b829d3e862371d2cfe5";

    fn token() -> SymmetricSecurityToken {
        SymmetricSecurityToken::new("kek", hex::decode(KEK).unwrap()).unwrap()
    }

    #[test]
    fn wraps_rfc3394_vector() {
        let method = KeyWrapMethod::new(algorithm::KW_AES128);
        let wrapped = token().wrap_key(&method, &hex::decode(KEY).unwrap()).unwrap();
        assert_eq!(hex::encode(&wrapped), WRAPPED);
        let key = token().unwrap_key(&method, &wrapped).unwrap();
        assert_eq!(hex::encode(key.as_slice()), KEY);
    }

    #[test]
    fn supported_algorithms_follow_key_size() {
        let t = token();
        assert!(t.is_supported_wrap_algorithm(algorithm::KW_AES128));
        assert!(!t.is_supported_wrap_algorithm(algorithm::KW_AES256));
        assert!(!t.is_supported_wrap_algorithm(algorithm::RSA_OAEP));
    }

    #[test]
    fn wrong_kek_size_is_a_key_error() {
        let method = KeyWrapMethod::new(algorithm::KW_AES256);
        let err = token().wrap_key(&method, &hex::decode(KEY).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Key(_)));
    }

    #[test]
    fn empty_key_rejected() {
        assert!(matches!(
            SymmetricSecurityToken::new("k", Vec::new()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn debug_hides_key() {
        let text = format!("{:?}", token().with_name("kek-name"));
        assert!(text.contains("16 bytes"));
        assert!(!text.contains("000102"));
    }
}
