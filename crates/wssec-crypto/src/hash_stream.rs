#![forbid(unsafe_code)]

use crate::digest::DigestAlgorithm;
use std::io;

/// A write-only stream feeding a hash.
///
/// Counts the bytes written so callers can log how much content was
/// digested.
pub struct HashStream<'a> {
    hash: &'a mut dyn DigestAlgorithm,
    length: u64,
}

impl<'a> HashStream<'a> {
    pub fn new(hash: &'a mut dyn DigestAlgorithm) -> Self {
        hash.reset();
        Self { hash, length: 0 }
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Finalize the hash and return its value. The stream can be written
    /// again afterwards and starts from an empty hash.
    pub fn flush_hash_and_get_value(&mut self) -> Vec<u8> {
        self.length = 0;
        self.hash.finalize_reset()
    }

    pub fn reset(&mut self) {
        self.length = 0;
        self.hash.reset();
    }
}

impl io::Write for HashStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hash.update(buf);
        self.length += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
