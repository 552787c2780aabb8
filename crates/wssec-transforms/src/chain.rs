#![forbid(unsafe_code)]

//! Ordered transforms of one reference.

use crate::factory::TransformFactory;
use crate::transform::{Transform, TransformInput};
use wssec_core::{algorithm, ns, Error, Result};
use wssec_crypto::DigestAlgorithm;
use wssec_xml::{XmlReader, XmlSink};

/// The transforms of a `<ds:Reference>`, in document order.
///
/// Only chains of exactly one transform can be processed. Longer chains
/// are read and written but rejected with `NotSupported` when a digest is
/// requested.
#[derive(Default)]
pub struct TransformChain {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(transform: Box<dyn Transform>) -> Self {
        Self {
            transforms: vec![transform],
        }
    }

    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Transform> {
        self.transforms.get(index).map(|t| t.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Transform> {
        self.transforms.iter().map(|t| t.as_ref())
    }

    pub fn algorithms(&self) -> Vec<&'static str> {
        self.iter().map(|t| t.algorithm()).collect()
    }

    /// True when the chain is exactly one STR-Transform.
    pub fn is_sole_str_transform(&self) -> bool {
        self.transforms.len() == 1 && self.transforms[0].algorithm() == algorithm::STR_TRANSFORM
    }

    /// Read a `<ds:Transforms>` element.
    pub fn read_from(reader: &mut dyn XmlReader, factory: &dyn TransformFactory) -> Result<Self> {
        if !reader.is_start_element(ns::node::TRANSFORMS, ns::DSIG)? {
            return Err(Error::MissingElement(ns::node::TRANSFORMS.into()));
        }
        if reader.is_empty_element() {
            return Err(Error::Protocol(format!(
                "<{}> must contain at least one transform",
                ns::node::TRANSFORMS
            )));
        }
        reader.read()?;

        let mut chain = Self::new();
        while reader.is_start_element(ns::node::TRANSFORM, ns::DSIG)? {
            let uri = reader.get_attribute(ns::attr::ALGORITHM, "").ok_or_else(|| {
                Error::MissingAttribute(format!("{} on {}", ns::attr::ALGORITHM, ns::node::TRANSFORM))
            })?;
            let mut transform = factory.create_transform(uri)?;
            transform.read_parameters(reader)?;
            chain.push(transform);
        }
        if chain.is_empty() {
            return Err(Error::Protocol(format!(
                "<{}> must contain at least one transform",
                ns::node::TRANSFORMS
            )));
        }
        reader.read_end_element()?;
        Ok(chain)
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        sink.write_start_element(ns::prefix::DSIG, ns::node::TRANSFORMS, ns::DSIG)?;
        for t in &self.transforms {
            t.write_to(sink)?;
        }
        sink.write_end_element()
    }

    fn sole(&self) -> Result<&dyn Transform> {
        match self.transforms.as_slice() {
            [only] => Ok(only.as_ref()),
            _ => Err(Error::NotSupported(format!(
                "transform chains of length {} (only a single transform is supported)",
                self.transforms.len()
            ))),
        }
    }

    pub fn process(&self, input: TransformInput<'_>) -> Result<Vec<u8>> {
        self.sole()?.process(input)
    }

    pub fn process_and_digest(
        &self,
        input: TransformInput<'_>,
        hash: &mut dyn DigestAlgorithm,
    ) -> Result<Vec<u8>> {
        self.sole()?.process_and_digest(input, hash)
    }
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.algorithms()).finish()
    }
}
