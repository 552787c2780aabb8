#![forbid(unsafe_code)]

//! `<ds:Reference>`.

use crate::pool::SignatureResourcePool;
use wssec_core::{ns, Error, Result};
use wssec_transforms::{TransformChain, TransformFactory, TransformInput};
use wssec_xml::{XmlReader, XmlSink};

#[derive(Debug)]
pub struct Reference {
    /// `URI` attribute: `""` or `#id`.
    pub uri: String,
    /// The reference element's own `Id` attribute.
    pub id: Option<String>,
    pub digest_method: String,
    pub digest_value: Vec<u8>,
    pub transforms: TransformChain,
}

impl Reference {
    /// A reference to be signed; the digest is filled in by
    /// [`Reference::compute_digest`].
    pub fn new(uri: impl Into<String>, digest_method: impl Into<String>, transforms: TransformChain) -> Self {
        Self {
            uri: uri.into(),
            id: None,
            digest_method: digest_method.into(),
            digest_value: Vec::new(),
            transforms,
        }
    }

    /// Read a `<ds:Reference>` element.
    pub fn read_from(reader: &mut dyn XmlReader, factory: &dyn TransformFactory) -> Result<Self> {
        if !reader.is_start_element(ns::node::REFERENCE, ns::DSIG)? {
            return Err(Error::MissingElement(ns::node::REFERENCE.into()));
        }
        let uri = reader
            .get_attribute(ns::attr::URI, "")
            .ok_or_else(|| {
                Error::MissingAttribute(format!("{} on {}", ns::attr::URI, ns::node::REFERENCE))
            })?
            .to_owned();
        let id = reader.get_attribute(ns::attr::ID, "").map(str::to_owned);
        if reader.is_empty_element() {
            return Err(Error::Protocol(format!("<{}> has no content", ns::node::REFERENCE)));
        }
        reader.read()?;

        // A reference without transforms is not accepted.
        let transforms = TransformChain::read_from(reader, factory)?;

        if !reader.is_start_element(ns::node::DIGEST_METHOD, ns::DSIG)? {
            return Err(Error::MissingElement(ns::node::DIGEST_METHOD.into()));
        }
        let digest_method = reader
            .get_attribute(ns::attr::ALGORITHM, "")
            .ok_or_else(|| {
                Error::MissingAttribute(format!(
                    "{} on {}",
                    ns::attr::ALGORITHM,
                    ns::node::DIGEST_METHOD
                ))
            })?
            .to_owned();
        reader.skip()?;

        let digest_value =
            reader.read_element_content_as_base64(ns::node::DIGEST_VALUE, ns::DSIG)?;
        reader.read_end_element()?;

        Ok(Self {
            uri,
            id,
            digest_method,
            digest_value,
            transforms,
        })
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        sink.write_start_element(ns::prefix::DSIG, ns::node::REFERENCE, ns::DSIG)?;
        if let Some(id) = &self.id {
            sink.write_attribute("", ns::attr::ID, "", id)?;
        }
        sink.write_attribute("", ns::attr::URI, "", &self.uri)?;
        self.transforms.write_to(sink)?;
        sink.write_start_element(ns::prefix::DSIG, ns::node::DIGEST_METHOD, ns::DSIG)?;
        sink.write_attribute("", ns::attr::ALGORITHM, "", &self.digest_method)?;
        sink.write_end_element()?;
        sink.write_start_element(ns::prefix::DSIG, ns::node::DIGEST_VALUE, ns::DSIG)?;
        sink.write_base64(&self.digest_value)?;
        sink.write_end_element()?;
        sink.write_end_element()
    }

    /// Digest `input` through the transform chain with the pooled hash
    /// algorithm named by `digest_method`.
    pub fn compute_digest(
        &self,
        input: TransformInput<'_>,
        pool: &mut SignatureResourcePool,
    ) -> Result<Vec<u8>> {
        if self.transforms.len() != 1 {
            // Checked before touching the pool or the input.
            return Err(Error::NotSupported(format!(
                "reference '{}' has {} transforms (only a single transform is supported)",
                self.uri,
                self.transforms.len()
            )));
        }
        let hash = pool.take_hash_algorithm(&self.digest_method)?;
        self.transforms.process_and_digest(input, hash)
    }

    /// Compute the digest of `input` and store it as the digest value.
    pub fn sign(&mut self, input: TransformInput<'_>, pool: &mut SignatureResourcePool) -> Result<()> {
        self.digest_value = self.compute_digest(input, pool)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wssec_core::algorithm;
    use wssec_crypto::AlgorithmRegistry;
    use wssec_transforms::{ExclusiveC14nTransform, StandardTransformFactory};
    use wssec_xml::{StreamReader, XmlTextWriter};

    fn pool() -> SignatureResourcePool {
        SignatureResourcePool::new(Arc::new(AlgorithmRegistry::standard()))
    }

    const REFERENCE: &str = concat!(
        r##"<ds:Reference xmlns:ds="http://www.w3.org/2000/09/xmldsig#" URI="#body">"##,
        r#"<ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/></ds:Transforms>"#,
        r#"<ds:DigestMethod Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/>"#,
        r#"<ds:DigestValue>qZk+NkcGgWq6PiVxeFDCbJzQ2J0=</ds:DigestValue>"#,
        r#"</ds:Reference>"#
    );

    #[test]
    fn reads_reference() {
        let mut r = StreamReader::from_str(REFERENCE);
        let reference = Reference::read_from(&mut r, &StandardTransformFactory).unwrap();
        assert_eq!(reference.uri, "#body");
        assert_eq!(reference.digest_method, algorithm::SHA1);
        assert_eq!(hex::encode(&reference.digest_value), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(reference.transforms.algorithms(), [algorithm::EXC_C14N]);
    }

    #[test]
    fn written_reference_reads_back() {
        let mut r = StreamReader::from_str(REFERENCE);
        let reference = Reference::read_from(&mut r, &StandardTransformFactory).unwrap();
        let mut w = XmlTextWriter::new(Vec::new());
        reference.write_to(&mut w).unwrap();
        let xml = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(xml, REFERENCE);
    }

    #[test]
    fn transforms_are_required() {
        let xml = REFERENCE.replace(
            r#"<ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/></ds:Transforms>"#,
            "",
        );
        let mut r = StreamReader::from_str(&xml);
        let err = Reference::read_from(&mut r, &StandardTransformFactory).unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));
    }

    #[test]
    fn sign_fills_digest() {
        let mut reference = Reference::new(
            "#a",
            algorithm::SHA256,
            TransformChain::single(Box::new(ExclusiveC14nTransform::default())),
        );
        let mut r = StreamReader::from_str("<a>hi</a>");
        reference.sign(TransformInput::Reader(&mut r), &mut pool()).unwrap();
        assert_eq!(
            reference.digest_value,
            wssec_crypto::digest::digest(algorithm::SHA256, b"<a>hi</a>").unwrap()
        );
    }

    #[test]
    fn unknown_digest_method() {
        let reference = Reference::new(
            "#a",
            "http://www.w3.org/2001/04/xmldsig-more#md5",
            TransformChain::single(Box::new(ExclusiveC14nTransform::default())),
        );
        let mut r = StreamReader::from_str("<a/>");
        let err = reference
            .compute_digest(TransformInput::Reader(&mut r), &mut pool())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
