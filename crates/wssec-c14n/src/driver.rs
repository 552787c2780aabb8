#![forbid(unsafe_code)]

//! Canonicalization of a live reader or a replayable element.

use crate::writer::CanonicalWriter;
use std::io::Write;
use wssec_core::{Error, Result};
use wssec_crypto::{DigestAlgorithm, HashStream};
use wssec_xml::reader::write_current_subtree;
use wssec_xml::{NodeKind, SecurityElement, XmlReader};

/// Where the canonicalized subtree comes from.
pub enum CanonicalInput<'a> {
    /// A reader positioned on (or before) the subtree's start element.
    Reader(&'a mut dyn XmlReader),
    /// A recorded or modelled element replayed through `write_to`.
    Element(&'a dyn SecurityElement),
}

/// Writes one subtree as Exclusive C14N bytes.
///
/// The input is consumed by every write; call one of the `set_input_*`
/// methods again before reusing the driver.
#[derive(Default)]
pub struct CanonicalizationDriver<'a> {
    pub include_comments: bool,
    pub inclusive_prefixes: Vec<String>,
    input: Option<CanonicalInput<'a>>,
}

impl<'a> CanonicalizationDriver<'a> {
    pub fn new(include_comments: bool, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            include_comments,
            inclusive_prefixes,
            input: None,
        }
    }

    pub fn set_input(&mut self, input: CanonicalInput<'a>) {
        self.input = Some(input);
    }

    pub fn set_input_reader(&mut self, reader: &'a mut dyn XmlReader) {
        self.set_input(CanonicalInput::Reader(reader));
    }

    pub fn set_input_element(&mut self, element: &'a dyn SecurityElement) {
        self.set_input(CanonicalInput::Element(element));
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn write_to(&mut self, out: &mut dyn Write) -> Result<()> {
        let input = self.input.take().ok_or_else(|| {
            Error::InvalidOperation("canonicalization driver has no input set".into())
        })?;

        let writer = CanonicalWriter::new(out, self.include_comments)
            .with_inclusive_prefixes(&self.inclusive_prefixes);
        let writer = match input {
            CanonicalInput::Reader(reader) => {
                if reader.move_to_content()? != NodeKind::Element {
                    return Err(Error::Protocol(
                        "canonicalization input is not positioned on an element".into(),
                    ));
                }
                let inherited = inherited_bindings(writer.inclusive_prefixes(), |p| {
                    reader.lookup_namespace(p)
                });
                let mut writer = writer.with_inherited_namespaces(inherited);
                if reader.supports_canonicalization() {
                    reader.write_canonical_subtree(&mut writer)?;
                } else {
                    write_current_subtree(reader, &mut writer)?;
                }
                writer
            }
            CanonicalInput::Element(element) => {
                let inherited = inherited_bindings(writer.inclusive_prefixes(), |p| {
                    element.lookup_inherited_namespace(p)
                });
                let mut writer = writer.with_inherited_namespaces(inherited);
                element.write_to(&mut writer)?;
                writer
            }
        };
        writer.finish()?;
        Ok(())
    }

    /// Canonicalize into `hash` and return the finalized digest.
    pub fn write_to_hash(&mut self, hash: &mut dyn DigestAlgorithm) -> Result<Vec<u8>> {
        let algorithm = hash.uri();
        if tracing::enabled!(tracing::Level::TRACE) {
            let bytes = self.get_bytes()?;
            tracing::trace!(
                algorithm,
                canonical = %String::from_utf8_lossy(&bytes),
                "pre-digest canonical bytes"
            );
            let mut stream = HashStream::new(hash);
            stream.write_all(&bytes)?;
            return Ok(stream.flush_hash_and_get_value());
        }
        let mut stream = HashStream::new(hash);
        self.write_to(&mut stream)?;
        tracing::debug!(algorithm, length = stream.length(), "canonicalized into digest");
        Ok(stream.flush_hash_and_get_value())
    }

    pub fn get_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        tracing::debug!(length = out.len(), "canonicalized");
        Ok(out)
    }
}

fn inherited_bindings<'r>(
    prefixes: &[String],
    lookup: impl Fn(&str) -> Option<&'r str>,
) -> Vec<(String, String)> {
    prefixes
        .iter()
        .filter_map(|p| {
            lookup(p)
                .filter(|uri| !uri.is_empty())
                .map(|uri| (p.clone(), uri.to_owned()))
        })
        .collect()
}
