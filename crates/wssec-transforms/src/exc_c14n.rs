#![forbid(unsafe_code)]

//! Exclusive canonicalization as a transform.

use crate::transform::{read_transform_element, write_transform_start, Transform, TransformInput};
use wssec_c14n::{C14nMode, CanonicalizationDriver};
use wssec_core::{ns, Error, Result};
use wssec_crypto::DigestAlgorithm;
use wssec_xml::{XmlReader, XmlSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveC14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl ExclusiveC14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
        }
    }

    pub fn mode(&self) -> C14nMode {
        self.mode
    }

    pub fn inclusive_prefixes(&self) -> &[String] {
        &self.inclusive_prefixes
    }

    fn driver<'a>(&self, input: TransformInput<'a>) -> CanonicalizationDriver<'a> {
        let mut driver =
            CanonicalizationDriver::new(self.mode.with_comments(), self.inclusive_prefixes.clone());
        driver.set_input(input);
        driver
    }

    /// Parse the optional `<ec:InclusiveNamespaces PrefixList=".."/>`.
    pub fn read_inclusive_namespaces(
        &mut self,
        reader: &mut dyn XmlReader,
    ) -> Result<()> {
        if reader.is_start_element(ns::node::INCLUSIVE_NAMESPACES, ns::EXC_C14N)? {
            self.inclusive_prefixes = reader
                .get_attribute(ns::attr::PREFIX_LIST, "")
                .ok_or_else(|| {
                    Error::MissingAttribute(format!(
                        "{} on {}",
                        ns::attr::PREFIX_LIST,
                        ns::node::INCLUSIVE_NAMESPACES
                    ))
                })?
                .split_whitespace()
                .map(str::to_owned)
                .collect();
            reader.skip()?;
        }
        Ok(())
    }

    pub fn write_inclusive_namespaces(&self, sink: &mut dyn XmlSink) -> Result<()> {
        if self.inclusive_prefixes.is_empty() {
            return Ok(());
        }
        sink.write_start_element(
            ns::prefix::EXC_C14N,
            ns::node::INCLUSIVE_NAMESPACES,
            ns::EXC_C14N,
        )?;
        sink.write_attribute("", ns::attr::PREFIX_LIST, "", &self.inclusive_prefixes.join(" "))?;
        sink.write_end_element()
    }
}

impl Default for ExclusiveC14nTransform {
    fn default() -> Self {
        Self::new(C14nMode::Exclusive, Vec::new())
    }
}

impl Transform for ExclusiveC14nTransform {
    fn algorithm(&self) -> &'static str {
        self.mode.uri()
    }

    fn read_parameters(&mut self, reader: &mut dyn XmlReader) -> Result<()> {
        read_transform_element(reader, |reader| {
            self.read_inclusive_namespaces(reader)?;
            if reader.is_start_of_any_element()? {
                return Err(Error::Protocol(format!(
                    "unexpected <{}> in exclusive canonicalization transform",
                    reader.local_name()
                )));
            }
            Ok(())
        })
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        write_transform_start(sink, self.algorithm())?;
        self.write_inclusive_namespaces(sink)?;
        sink.write_end_element()
    }

    fn process(&self, input: TransformInput<'_>) -> Result<Vec<u8>> {
        self.driver(input).get_bytes()
    }

    fn process_and_digest(
        &self,
        input: TransformInput<'_>,
        hash: &mut dyn DigestAlgorithm,
    ) -> Result<Vec<u8>> {
        self.driver(input).write_to_hash(hash)
    }
}
