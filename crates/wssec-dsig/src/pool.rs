#![forbid(unsafe_code)]

//! Per-message scratch objects for signing and verification.

use std::sync::Arc;
use wssec_core::Result;
use wssec_crypto::{CryptoProvider, DigestAlgorithm, HashStream};
use wssec_xml::XmlTextWriter;

/// Reusable buffers and one hash algorithm instance.
///
/// For sequential use by one operation at a time. Every `take_*` call
/// hands out the entry in its initial state, so whatever the previous
/// user left behind is discarded. The pool holds a non-`Sync` hash and
/// cannot be shared between threads.
pub struct SignatureResourcePool {
    provider: Arc<dyn CryptoProvider>,
    hash: Option<Box<dyn DigestAlgorithm>>,
    encoding_buffer: Vec<u8>,
    char_buffer: String,
    writer_buffer: Vec<u8>,
}

impl SignatureResourcePool {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            provider,
            hash: None,
            encoding_buffer: Vec::new(),
            char_buffer: String::new(),
            writer_buffer: Vec::new(),
        }
    }

    /// The pooled hash algorithm for `uri`, reset. A new instance is only
    /// created when `uri` differs from the cached one.
    pub fn take_hash_algorithm(&mut self, uri: &str) -> Result<&mut dyn DigestAlgorithm> {
        let hash = match self.hash.take() {
            Some(mut cached) if cached.uri() == uri => {
                cached.reset();
                cached
            }
            _ => self.provider.create_hash_algorithm(uri)?,
        };
        Ok(&mut **self.hash.insert(hash))
    }

    pub fn take_hash_stream(&mut self, uri: &str) -> Result<HashStream<'_>> {
        Ok(HashStream::new(self.take_hash_algorithm(uri)?))
    }

    /// An empty byte buffer with room for at least `min_size` bytes.
    pub fn take_encoding_buffer(&mut self, min_size: usize) -> &mut Vec<u8> {
        self.encoding_buffer.clear();
        self.encoding_buffer.reserve(min_size);
        &mut self.encoding_buffer
    }

    pub fn take_char_buffer(&mut self, min_size: usize) -> &mut String {
        self.char_buffer.clear();
        self.char_buffer.reserve(min_size);
        &mut self.char_buffer
    }

    /// A UTF-8 XML writer over the pooled output buffer.
    pub fn take_utf8_writer(&mut self) -> XmlTextWriter<&mut Vec<u8>> {
        self.writer_buffer.clear();
        XmlTextWriter::new(&mut self.writer_buffer)
    }
}

impl std::fmt::Debug for SignatureResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureResourcePool")
            .field("hash", &self.hash.as_ref().map(|h| h.uri()))
            .finish_non_exhaustive()
    }
}
