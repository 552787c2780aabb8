#![forbid(unsafe_code)]

//! `<ds:SignedInfo>`.
//!
//! An incoming SignedInfo is recorded while it is parsed so the exact
//! signed bytes can be canonicalized again for the signature check.

use crate::context::DsigContext;
use crate::pool::SignatureResourcePool;
use crate::reference::Reference;
use crate::wrapper::{DigestApplication, DigestSource, ReferenceWrapper};
use std::io::Write;
use wssec_c14n::{C14nMode, CanonicalizationDriver};
use wssec_core::{ns, Error, Result};
use wssec_crypto::{fixed_time_eq, CryptoProvider};
use wssec_transforms::ExclusiveC14nTransform;
use wssec_xml::{RecordingReader, SecurityElement, TokenBuffer, XmlReader, XmlSink};

#[derive(Debug)]
pub struct SignedInfo {
    pub id: Option<String>,
    pub canonicalization: ExclusiveC14nTransform,
    pub signature_method: String,
    references: Vec<ReferenceWrapper>,
    recorded: Option<TokenBuffer>,
}

impl SignedInfo {
    pub fn new(canonicalization: ExclusiveC14nTransform, signature_method: impl Into<String>) -> Self {
        Self {
            id: None,
            canonicalization,
            signature_method: signature_method.into(),
            references: Vec::new(),
            recorded: None,
        }
    }

    pub fn add_reference(&mut self, reference: Reference) -> Result<()> {
        self.references.push(ReferenceWrapper::new(reference)?);
        Ok(())
    }

    pub fn references(&self) -> &[ReferenceWrapper] {
        &self.references
    }

    pub fn is_recorded(&self) -> bool {
        self.recorded.is_some()
    }

    /// Read a `<ds:SignedInfo>` element, recording it.
    pub fn read_from(reader: &mut dyn XmlReader, ctx: &DsigContext) -> Result<Self> {
        if !reader.is_start_element(ns::node::SIGNED_INFO, ns::DSIG)? {
            return Err(Error::MissingElement(ns::node::SIGNED_INFO.into()));
        }
        let mut recording = RecordingReader::attach_with_quotas(&mut *reader, &ctx.quotas)?;
        let mut signed_info = Self::read_body(&mut recording, ctx)?;
        signed_info.recorded = Some(recording.into_buffer()?);
        tracing::debug!(
            references = signed_info.references.len(),
            signature_method = %signed_info.signature_method,
            "read SignedInfo"
        );
        Ok(signed_info)
    }

    fn read_body(reader: &mut dyn XmlReader, ctx: &DsigContext) -> Result<Self> {
        let id = reader.get_attribute(ns::attr::ID, "").map(str::to_owned);
        if reader.is_empty_element() {
            return Err(Error::MissingElement(ns::node::CANONICALIZATION_METHOD.into()));
        }
        reader.read()?;

        if !reader.is_start_element(ns::node::CANONICALIZATION_METHOD, ns::DSIG)? {
            return Err(Error::MissingElement(ns::node::CANONICALIZATION_METHOD.into()));
        }
        let c14n_uri = required_algorithm(reader, ns::node::CANONICALIZATION_METHOD)?;
        let mode = C14nMode::from_uri(&c14n_uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
        let mut canonicalization = ExclusiveC14nTransform::new(mode, Vec::new());
        if reader.is_empty_element() {
            reader.read()?;
        } else {
            reader.read()?;
            canonicalization.read_inclusive_namespaces(reader)?;
            reader.read_end_element()?;
        }

        if !reader.is_start_element(ns::node::SIGNATURE_METHOD, ns::DSIG)? {
            return Err(Error::MissingElement(ns::node::SIGNATURE_METHOD.into()));
        }
        let signature_method = required_algorithm(reader, ns::node::SIGNATURE_METHOD)?;
        reader.skip()?;

        let mut signed_info = Self::new(canonicalization, signature_method);
        signed_info.id = id;
        while reader.is_start_element(ns::node::REFERENCE, ns::DSIG)? {
            let reference = Reference::read_from(reader, ctx.transform_factory.as_ref())?;
            signed_info.add_reference(reference)?;
        }
        if signed_info.references.is_empty() {
            return Err(Error::MissingElement(ns::node::REFERENCE.into()));
        }
        reader.read_end_element()?;
        Ok(signed_info)
    }

    /// The canonical form of this SignedInfo: the recorded bytes for an
    /// incoming one, the generated element otherwise.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_canonical(&mut out)?;
        Ok(out)
    }

    fn write_canonical(&self, out: &mut dyn Write) -> Result<()> {
        let mut driver = CanonicalizationDriver::new(
            self.canonicalization.mode().with_comments(),
            self.canonicalization.inclusive_prefixes().to_vec(),
        );
        driver.set_input_element(self);
        driver.write_to(out)
    }

    /// Keyed hash of the canonical SignedInfo.
    pub fn compute_signature(
        &self,
        key: &[u8],
        provider: &dyn CryptoProvider,
        pool: &mut SignatureResourcePool,
    ) -> Result<Vec<u8>> {
        let mut mac = provider.create_keyed_hash_algorithm(key, &self.signature_method)?;
        let buffer = pool.take_encoding_buffer(0);
        self.write_canonical(&mut *buffer)?;
        mac.update(buffer);
        Ok(mac.finalize_reset())
    }

    pub fn verify_signature(
        &self,
        key: &[u8],
        signature_value: &[u8],
        provider: &dyn CryptoProvider,
        pool: &mut SignatureResourcePool,
    ) -> Result<()> {
        let computed = self.compute_signature(key, provider, pool)?;
        if !fixed_time_eq(&computed, signature_value) {
            return Err(Error::SignatureInvalid(format!(
                "{} value does not match",
                ns::node::SIGNATURE_VALUE
            )));
        }
        Ok(())
    }

    /// Offer the element with `candidate_id` to the reference that targets
    /// it; failing that, to the first STR-Transform reference still open.
    pub fn ensure_digest_validity(
        &mut self,
        candidate_id: &str,
        source: DigestSource<'_>,
        pool: &mut SignatureResourcePool,
    ) -> Result<DigestApplication> {
        let index = self
            .references
            .iter()
            .position(|r| !r.is_verified() && r.target().matches(candidate_id))
            .or_else(|| self.references.iter().position(|r| r.applies_to(candidate_id)));
        match index {
            Some(i) => self.references[i].ensure_digest_validity(candidate_id, source, pool),
            None => Ok(DigestApplication::NotApplicable),
        }
    }

    /// Fails naming the first reference whose target was never verified.
    pub fn ensure_all_references_verified(&self) -> Result<()> {
        match self.references.iter().find(|r| !r.is_verified()) {
            Some(unverified) => Err(Error::DigestVerificationFailed(format!(
                "{} (target not verified)",
                unverified.reference().uri
            ))),
            None => Ok(()),
        }
    }
}

impl SecurityElement for SignedInfo {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        if let Some(recorded) = &self.recorded {
            return recorded.write_to(sink);
        }
        sink.write_start_element(ns::prefix::DSIG, ns::node::SIGNED_INFO, ns::DSIG)?;
        if let Some(id) = &self.id {
            sink.write_attribute("", ns::attr::ID, "", id)?;
        }
        sink.write_start_element(ns::prefix::DSIG, ns::node::CANONICALIZATION_METHOD, ns::DSIG)?;
        sink.write_attribute("", ns::attr::ALGORITHM, "", self.canonicalization.mode().uri())?;
        self.canonicalization.write_inclusive_namespaces(sink)?;
        sink.write_end_element()?;
        sink.write_start_element(ns::prefix::DSIG, ns::node::SIGNATURE_METHOD, ns::DSIG)?;
        sink.write_attribute("", ns::attr::ALGORITHM, "", &self.signature_method)?;
        sink.write_end_element()?;
        for r in &self.references {
            r.reference().write_to(sink)?;
        }
        sink.write_end_element()
    }

    fn lookup_inherited_namespace(&self, prefix: &str) -> Option<&str> {
        self.recorded
            .as_ref()
            .and_then(|r| r.lookup_inherited_namespace(prefix))
    }
}

fn required_algorithm(reader: &dyn XmlReader, element: &str) -> Result<String> {
    reader
        .get_attribute(ns::attr::ALGORITHM, "")
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingAttribute(format!("{} on {element}", ns::attr::ALGORITHM)))
}
