#![forbid(unsafe_code)]

//! Exclusive XML Canonicalization for wssec.
//!
//! Canonicalization never builds a tree: the subtree is streamed from a
//! reader or a recorded token buffer straight into a [`CanonicalWriter`],
//! whose output goes to any `io::Write`, usually a hash.

pub mod driver;
pub mod escape;
pub mod render;
pub mod writer;

pub use driver::{CanonicalInput, CanonicalizationDriver};
pub use writer::CanonicalWriter;

use wssec_core::{algorithm, Error, Result};
use wssec_xml::StreamReader;

/// Supported canonicalization algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    Exclusive,
    ExclusiveWithComments,
}

impl C14nMode {
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveWithComments)
    }
}

/// Canonicalize the document element of `xml`.
pub fn canonicalize(xml: &str, mode: C14nMode, inclusive_prefixes: &[String]) -> Result<Vec<u8>> {
    let mut reader = StreamReader::from_str(xml);
    let mut driver = CanonicalizationDriver::new(mode.with_comments(), inclusive_prefixes.to_vec());
    driver.set_input_reader(&mut reader);
    driver.get_bytes()
}

/// Canonicalize with the algorithm named by `uri`.
pub fn canonicalize_with_uri(xml: &str, uri: &str, inclusive_prefixes: &[String]) -> Result<Vec<u8>> {
    let mode = C14nMode::from_uri(uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("canonicalization: {uri}")))?;
    canonicalize(xml, mode, inclusive_prefixes)
}
