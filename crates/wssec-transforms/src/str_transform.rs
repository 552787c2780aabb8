#![forbid(unsafe_code)]

//! STR-Transform (WS-Security SOAP Message Security 1.0, section 8.3).
//!
//! The reference points at a `<wsse:SecurityTokenReference>`; what gets
//! digested is the token it resolves to, canonicalized with the method
//! given in `<wsse:TransformationParameters>`. Resolving the reference is
//! the caller's job, so the input here is already the token.

use crate::exc_c14n::ExclusiveC14nTransform;
use crate::transform::{read_transform_element, write_transform_start, Transform, TransformInput};
use wssec_c14n::C14nMode;
use wssec_core::{algorithm, ns, Error, Result};
use wssec_crypto::DigestAlgorithm;
use wssec_xml::{XmlReader, XmlSink};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrTransform {
    canonicalization: ExclusiveC14nTransform,
}

impl StrTransform {
    pub fn new(canonicalization: ExclusiveC14nTransform) -> Self {
        Self { canonicalization }
    }

    pub fn canonicalization_method(&self) -> &'static str {
        self.canonicalization.algorithm()
    }

    fn read_transformation_parameters(&mut self, reader: &mut dyn XmlReader) -> Result<()> {
        if !reader.is_start_element(ns::node::TRANSFORMATION_PARAMETERS, ns::WSSE)? {
            return Err(Error::MissingElement(format!(
                "{} in STR-Transform",
                ns::node::TRANSFORMATION_PARAMETERS
            )));
        }
        if reader.is_empty_element() {
            return Err(Error::MissingElement(format!(
                "{} in {}",
                ns::node::CANONICALIZATION_METHOD,
                ns::node::TRANSFORMATION_PARAMETERS
            )));
        }
        reader.read()?;

        if !reader.is_start_element(ns::node::CANONICALIZATION_METHOD, ns::DSIG)? {
            return Err(Error::MissingElement(format!(
                "{} in {}",
                ns::node::CANONICALIZATION_METHOD,
                ns::node::TRANSFORMATION_PARAMETERS
            )));
        }
        let uri = reader
            .get_attribute(ns::attr::ALGORITHM, "")
            .ok_or_else(|| {
                Error::MissingAttribute(format!(
                    "{} on {}",
                    ns::attr::ALGORITHM,
                    ns::node::CANONICALIZATION_METHOD
                ))
            })?
            .to_owned();
        let mode = C14nMode::from_uri(&uri).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("STR-Transform canonicalization: {uri}"))
        })?;
        let mut canonicalization = ExclusiveC14nTransform::new(mode, Vec::new());
        if reader.is_empty_element() {
            reader.read()?;
        } else {
            reader.read()?;
            canonicalization.read_inclusive_namespaces(reader)?;
            reader.read_end_element()?;
        }
        self.canonicalization = canonicalization;

        reader.read_end_element()
    }
}

impl Transform for StrTransform {
    fn algorithm(&self) -> &'static str {
        algorithm::STR_TRANSFORM
    }

    fn read_parameters(&mut self, reader: &mut dyn XmlReader) -> Result<()> {
        if reader.is_start_element(ns::node::TRANSFORM, ns::DSIG)? && reader.is_empty_element() {
            return Err(Error::MissingElement(format!(
                "{} in STR-Transform",
                ns::node::TRANSFORMATION_PARAMETERS
            )));
        }
        read_transform_element(reader, |reader| self.read_transformation_parameters(reader))
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        write_transform_start(sink, algorithm::STR_TRANSFORM)?;
        sink.write_start_element(ns::prefix::WSSE, ns::node::TRANSFORMATION_PARAMETERS, ns::WSSE)?;
        sink.write_start_element(ns::prefix::DSIG, ns::node::CANONICALIZATION_METHOD, ns::DSIG)?;
        sink.write_attribute("", ns::attr::ALGORITHM, "", self.canonicalization.algorithm())?;
        self.canonicalization.write_inclusive_namespaces(sink)?;
        sink.write_end_element()?;
        sink.write_end_element()?;
        sink.write_end_element()
    }

    fn process(&self, input: TransformInput<'_>) -> Result<Vec<u8>> {
        self.canonicalization.process(input)
    }

    fn process_and_digest(
        &self,
        input: TransformInput<'_>,
        hash: &mut dyn DigestAlgorithm,
    ) -> Result<Vec<u8>> {
        self.canonicalization.process_and_digest(input, hash)
    }
}
