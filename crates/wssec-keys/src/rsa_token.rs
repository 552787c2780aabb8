#![forbid(unsafe_code)]

//! RSA key transport tokens.

use crate::clause::{KeyIdentifierClause, KeyIdentifierClauseKind};
use crate::token::{KeyWrapMethod, KeyWrappingToken, SecurityToken};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::sync::Arc;
use wssec_core::{Error, Result};
use wssec_crypto::AlgorithmRegistry;
use zeroize::Zeroizing;

/// Decides whether a DER certificate may be used.
///
/// Path building, revocation and trust anchors are the validator's
/// business; tokens only ask.
pub trait CertificateValidator: Send + Sync {
    fn validate(&self, certificate: &[u8]) -> Result<()>;
}

/// An RSA key, optionally with the certificate it was issued in.
pub struct RsaSecurityToken {
    id: String,
    name: Option<String>,
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
    certificate: Option<Vec<u8>>,
    issuer_serial: Option<(String, String)>,
    registry: Arc<AlgorithmRegistry>,
}

impl RsaSecurityToken {
    pub fn from_private_key(id: impl Into<String>, private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self::build(id.into(), public, Some(private))
    }

    pub fn from_public_key(id: impl Into<String>, public: RsaPublicKey) -> Self {
        Self::build(id.into(), public, None)
    }

    fn build(id: String, public: RsaPublicKey, private: Option<RsaPrivateKey>) -> Self {
        Self {
            id,
            name: None,
            public,
            private,
            certificate: None,
            issuer_serial: None,
            registry: Arc::new(AlgorithmRegistry::standard()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_registry(mut self, registry: Arc<AlgorithmRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Attach the DER certificate for this key once `validator` accepts it.
    pub fn with_certificate(
        mut self,
        certificate: Vec<u8>,
        validator: &dyn CertificateValidator,
    ) -> Result<Self> {
        validator.validate(&certificate)?;
        self.certificate = Some(certificate);
        Ok(self)
    }

    /// Issuer distinguished name and decimal serial number of the
    /// certificate, as carried in `ds:X509IssuerSerial`.
    pub fn with_issuer_serial(mut self, issuer: impl Into<String>, serial: impl Into<String>) -> Self {
        self.issuer_serial = Some((issuer.into(), serial.into()));
        self
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    pub fn certificate(&self) -> Option<&[u8]> {
        self.certificate.as_deref()
    }

    /// SHA-1 over the DER certificate.
    pub fn thumbprint(&self) -> Option<Vec<u8>> {
        self.certificate.as_deref().map(wssec_crypto::digest::sha1)
    }
}

impl std::fmt::Debug for RsaSecurityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.private.is_some() {
            "RSA private+public key"
        } else {
            "RSA public key"
        };
        f.debug_struct("RsaSecurityToken")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &key)
            .field("certificate", &self.certificate.as_ref().map(Vec::len))
            .finish()
    }
}

impl SecurityToken for RsaSecurityToken {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn matches_key_identifier_clause(&self, clause: &KeyIdentifierClause) -> bool {
        match clause {
            KeyIdentifierClause::X509Thumbprint(thumbprint) => {
                self.thumbprint().as_deref() == Some(thumbprint.as_slice())
            }
            KeyIdentifierClause::X509IssuerSerial { issuer, serial } => self
                .issuer_serial
                .as_ref()
                .map_or(false, |(i, s)| i == issuer && s == serial),
            KeyIdentifierClause::LocalId { id, .. } => *id == self.id,
            KeyIdentifierClause::KeyName(name) => self.name.as_deref() == Some(name.as_str()),
            _ => false,
        }
    }

    fn can_create_key_identifier_clause(&self, kind: KeyIdentifierClauseKind) -> bool {
        match kind {
            KeyIdentifierClauseKind::LocalId => true,
            KeyIdentifierClauseKind::KeyName => self.name.is_some(),
            KeyIdentifierClauseKind::X509Thumbprint => self.certificate.is_some(),
            KeyIdentifierClauseKind::X509IssuerSerial => self.issuer_serial.is_some(),
            KeyIdentifierClauseKind::EncryptedKeyHash => false,
        }
    }

    fn create_key_identifier_clause(&self, kind: KeyIdentifierClauseKind) -> Result<KeyIdentifierClause> {
        let clause = match kind {
            KeyIdentifierClauseKind::LocalId => Some(KeyIdentifierClause::local_id(&self.id)),
            KeyIdentifierClauseKind::KeyName => self.name.clone().map(KeyIdentifierClause::KeyName),
            KeyIdentifierClauseKind::X509Thumbprint => {
                self.thumbprint().map(KeyIdentifierClause::X509Thumbprint)
            }
            KeyIdentifierClauseKind::X509IssuerSerial => {
                self.issuer_serial
                    .clone()
                    .map(|(issuer, serial)| KeyIdentifierClause::X509IssuerSerial { issuer, serial })
            }
            KeyIdentifierClauseKind::EncryptedKeyHash => None,
        };
        clause.ok_or_else(|| {
            Error::InvalidOperation(format!("token '{}' cannot create a {kind:?} clause", self.id))
        })
    }
}

impl KeyWrappingToken for RsaSecurityToken {
    fn is_supported_wrap_algorithm(&self, algorithm: &str) -> bool {
        self.registry.key_transport(algorithm, Default::default()).is_ok()
    }

    fn wrap_key(&self, method: &KeyWrapMethod, key: &[u8]) -> Result<Vec<u8>> {
        let kt = self
            .registry
            .key_transport(&method.algorithm, method.oaep_params.clone())?;
        kt.encrypt(&self.public, key)
    }

    fn unwrap_key(&self, method: &KeyWrapMethod, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private = self
            .private
            .as_ref()
            .ok_or_else(|| Error::Key(format!("token '{}' has no RSA private key", self.id)))?;
        let kt = self
            .registry
            .key_transport(&method.algorithm, method.oaep_params.clone())?;
        kt.decrypt(private, wrapped).map(Zeroizing::new)
    }
}
