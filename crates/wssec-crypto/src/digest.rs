#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations.

use digest::Digest;
use wssec_core::{algorithm, Error, Result};

/// An incremental hash that can be reused after finalizing.
pub trait DigestAlgorithm: Send {
    /// Feed data into the hash.
    fn update(&mut self, data: &[u8]);
    /// Return the hash value and reset to the initial state.
    fn finalize_reset(&mut self) -> Vec<u8>;
    /// Discard any data fed so far.
    fn reset(&mut self);
    /// Algorithm URI.
    fn uri(&self) -> &'static str;
    /// Length of the hash value in bytes.
    fn output_size(&self) -> usize;
}

/// Create a digest algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>> {
    match uri {
        algorithm::SHA1 => Ok(Box::new(Sha1Digest::new())),
        algorithm::SHA256 => Ok(Box::new(Sha256Digest::new())),
        algorithm::SHA384 => Ok(Box::new(Sha384Digest::new())),
        algorithm::SHA512 => Ok(Box::new(Sha512Digest::new())),
        _ => Err(Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}"))),
    }
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize_reset())
}

/// SHA-1 of `data`. Used for content identifiers, never for signatures.
pub fn sha1(data: &[u8]) -> Vec<u8> {
    sha1::Sha1::digest(data).to_vec()
}

// ── Concrete implementations ─────────────────────────────────────────

macro_rules! impl_digest {
    ($name:ident, $hasher:ty, $uri:expr) => {
        struct $name {
            inner: $hasher,
        }

        impl $name {
            fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl DigestAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize_reset(&mut self) -> Vec<u8> {
                Digest::finalize_reset(&mut self.inner).to_vec()
            }

            fn reset(&mut self) {
                Digest::reset(&mut self.inner);
            }

            fn uri(&self) -> &'static str {
                $uri
            }

            fn output_size(&self) -> usize {
                <$hasher as Digest>::output_size()
            }
        }
    };
}

impl_digest!(Sha1Digest, sha1::Sha1, algorithm::SHA1);
impl_digest!(Sha256Digest, sha2::Sha256, algorithm::SHA256);
impl_digest!(Sha384Digest, sha2::Sha384, algorithm::SHA384);
impl_digest!(Sha512Digest, sha2::Sha512, algorithm::SHA512);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let result = digest(algorithm::SHA256, b"hello").unwrap();
        assert_eq!(
            hex::encode(result),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_output_sizes() {
        for (uri, len) in [
            (algorithm::SHA1, 20),
            (algorithm::SHA256, 32),
            (algorithm::SHA384, 48),
            (algorithm::SHA512, 64),
        ] {
            let h = from_uri(uri).unwrap();
            assert_eq!(h.output_size(), len);
            assert_eq!(h.uri(), uri);
        }
    }

    #[test]
    fn test_reuse_after_finalize() {
        let mut h = from_uri(algorithm::SHA1).unwrap();
        h.update(b"first");
        let a = h.finalize_reset();
        h.update(b"garbage");
        h.reset();
        h.update(b"first");
        assert_eq!(h.finalize_reset(), a);
        assert_eq!(a, sha1(b"first"));
    }

    #[test]
    fn test_unknown_uri() {
        let err = from_uri("http://example.com/md4").err().unwrap();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
