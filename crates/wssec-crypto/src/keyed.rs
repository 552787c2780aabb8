#![forbid(unsafe_code)]

//! HMAC signature algorithms.

use hmac::{Hmac, Mac};
use wssec_core::{algorithm, Error, Result};

/// A keyed hash (MAC) that can be reused after finalizing.
pub trait KeyedHashAlgorithm: Send {
    fn update(&mut self, data: &[u8]);
    /// Return the MAC and reset to the keyed initial state.
    fn finalize_reset(&mut self) -> Vec<u8>;
    fn reset(&mut self);
    fn uri(&self) -> &'static str;
    fn output_size(&self) -> usize;
}

/// Create an HMAC algorithm from its URI.
pub fn from_uri(key: &[u8], uri: &str) -> Result<Box<dyn KeyedHashAlgorithm>> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("HMAC key is empty".into()));
    }
    match uri {
        algorithm::HMAC_SHA1 => Ok(Box::new(HmacSha1::new(key)?)),
        algorithm::HMAC_SHA256 => Ok(Box::new(HmacSha256::new(key)?)),
        algorithm::HMAC_SHA384 => Ok(Box::new(HmacSha384::new(key)?)),
        algorithm::HMAC_SHA512 => Ok(Box::new(HmacSha512::new(key)?)),
        _ => Err(Error::UnsupportedAlgorithm(format!("keyed hash algorithm: {uri}"))),
    }
}

macro_rules! impl_hmac {
    ($name:ident, $hasher:ty, $uri:expr) => {
        struct $name {
            inner: Hmac<$hasher>,
        }

        impl $name {
            fn new(key: &[u8]) -> Result<Self> {
                let inner = <Hmac<$hasher> as Mac>::new_from_slice(key)
                    .map_err(|e| Error::Key(format!("HMAC key: {e}")))?;
                Ok(Self { inner })
            }
        }

        impl KeyedHashAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Mac::update(&mut self.inner, data);
            }

            fn finalize_reset(&mut self) -> Vec<u8> {
                Mac::finalize_reset(&mut self.inner).into_bytes().to_vec()
            }

            fn reset(&mut self) {
                Mac::reset(&mut self.inner);
            }

            fn uri(&self) -> &'static str {
                $uri
            }

            fn output_size(&self) -> usize {
                <Hmac<$hasher> as digest::OutputSizeUser>::output_size()
            }
        }
    };
}

impl_hmac!(HmacSha1, sha1::Sha1, algorithm::HMAC_SHA1);
impl_hmac!(HmacSha256, sha2::Sha256, algorithm::HMAC_SHA256);
impl_hmac!(HmacSha384, sha2::Sha384, algorithm::HMAC_SHA384);
impl_hmac!(HmacSha512, sha2::Sha512, algorithm::HMAC_SHA512);
