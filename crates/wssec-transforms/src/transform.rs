#![forbid(unsafe_code)]

//! The transform trait.

use wssec_core::{ns, Result};
use wssec_crypto::DigestAlgorithm;
use wssec_xml::{XmlReader, XmlSink};

/// Input of the first transform of a chain: the dereferenced element.
pub type TransformInput<'a> = wssec_c14n::CanonicalInput<'a>;

/// One step of a reference's transform chain.
pub trait Transform: Send + Sync {
    /// The algorithm URI for this transform.
    fn algorithm(&self) -> &'static str;

    /// Read the `<ds:Transform>` element the reader is positioned on,
    /// including its end tag. The `Algorithm` attribute has already been
    /// used to create `self`.
    fn read_parameters(&mut self, reader: &mut dyn XmlReader) -> Result<()>;

    /// Write this transform as a `<ds:Transform>` element.
    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()>;

    /// Run the transform and return its octet output.
    fn process(&self, input: TransformInput<'_>) -> Result<Vec<u8>>;

    /// Run the transform straight into `hash` and return the digest value.
    fn process_and_digest(
        &self,
        input: TransformInput<'_>,
        hash: &mut dyn DigestAlgorithm,
    ) -> Result<Vec<u8>>;
}

/// Consume a `<ds:Transform>` element, handing its content to `body`.
pub(crate) fn read_transform_element(
    reader: &mut dyn XmlReader,
    body: impl FnOnce(&mut dyn XmlReader) -> Result<()>,
) -> Result<()> {
    reader.move_to_content()?;
    let empty = reader.is_empty_element();
    reader.read_start_element(ns::node::TRANSFORM, ns::DSIG)?;
    if empty {
        return Ok(());
    }
    body(&mut *reader)?;
    reader.read_end_element()
}

/// Write `<ds:Transform Algorithm="..">`, leaving the element open.
pub(crate) fn write_transform_start(sink: &mut dyn XmlSink, algorithm: &str) -> Result<()> {
    sink.write_start_element(ns::prefix::DSIG, ns::node::TRANSFORM, ns::DSIG)?;
    sink.write_attribute("", ns::attr::ALGORITHM, "", algorithm)
}
