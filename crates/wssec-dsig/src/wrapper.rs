#![forbid(unsafe_code)]

//! Digest verification state of one reference.

use crate::pool::SignatureResourcePool;
use crate::reference::Reference;
use base64::Engine;
use wssec_core::{Error, Result};
use wssec_crypto::fixed_time_eq;
use wssec_transforms::TransformInput;

/// What a reference URI points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// `URI=""`: the element enclosing the signature.
    Enclosing,
    /// `URI="#id"`.
    Id(String),
}

impl ReferenceTarget {
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.is_empty() {
            return Ok(Self::Enclosing);
        }
        match uri.strip_prefix('#') {
            Some(id) if !id.is_empty() => Ok(Self::Id(id.to_owned())),
            _ => Err(Error::InvalidUri(uri.to_owned())),
        }
    }

    /// The enclosing element is offered with an empty candidate id.
    pub fn matches(&self, candidate_id: &str) -> bool {
        match self {
            Self::Enclosing => candidate_id.is_empty(),
            Self::Id(id) => id == candidate_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Unverified,
    Verified,
}

/// Outcome of [`ReferenceWrapper::ensure_digest_validity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestApplication {
    /// The digest was checked and matched.
    Applied,
    /// The candidate is not this reference's target, or the reference was
    /// already verified.
    NotApplicable,
}

/// The content a digest is checked against.
pub enum DigestSource<'a> {
    /// An already computed digest value, compared as-is.
    Digest(&'a [u8]),
    /// The dereferenced element, run through the transform chain.
    Input(TransformInput<'a>),
}

#[derive(Debug)]
pub struct ReferenceWrapper {
    reference: Reference,
    target: ReferenceTarget,
    state: VerificationState,
}

impl ReferenceWrapper {
    /// Wrap `reference`. Malformed URIs are rejected here, before any
    /// digest work.
    pub fn new(reference: Reference) -> Result<Self> {
        let target = ReferenceTarget::parse(&reference.uri)?;
        Ok(Self {
            reference,
            target,
            state: VerificationState::Unverified,
        })
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn into_reference(self) -> Reference {
        self.reference
    }

    pub fn target(&self) -> &ReferenceTarget {
        &self.target
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn is_verified(&self) -> bool {
        self.state == VerificationState::Verified
    }

    /// Whether [`ensure_digest_validity`](Self::ensure_digest_validity)
    /// would check the digest for `candidate_id`.
    ///
    /// A reference whose only transform is STR-Transform applies to any
    /// candidate: its URI names the SecurityTokenReference, not the token
    /// being digested.
    pub fn applies_to(&self, candidate_id: &str) -> bool {
        !self.is_verified()
            && (self.reference.transforms.is_sole_str_transform()
                || self.target.matches(candidate_id))
    }

    pub fn ensure_digest_validity(
        &mut self,
        candidate_id: &str,
        source: DigestSource<'_>,
        pool: &mut SignatureResourcePool,
    ) -> Result<DigestApplication> {
        if !self.applies_to(candidate_id) {
            return Ok(DigestApplication::NotApplicable);
        }
        let uri = &self.reference.uri;
        if self.reference.transforms.len() != 1 {
            return Err(Error::NotSupported(format!(
                "reference '{uri}' has {} transforms (only a single transform is supported)",
                self.reference.transforms.len()
            )));
        }

        let computed = match source {
            DigestSource::Digest(value) => value.to_vec(),
            DigestSource::Input(input) => self.reference.compute_digest(input, pool)?,
        };
        if !fixed_time_eq(&computed, &self.reference.digest_value) {
            tracing::debug!(
                uri = %uri,
                expected = %base64::engine::general_purpose::STANDARD.encode(&self.reference.digest_value),
                computed = %base64::engine::general_purpose::STANDARD.encode(&computed),
                "reference digest mismatch"
            );
            return Err(Error::DigestVerificationFailed(uri.clone()));
        }

        tracing::debug!(uri = %uri, candidate_id, "reference digest verified");
        self.state = VerificationState::Verified;
        Ok(DigestApplication::Applied)
    }
}
