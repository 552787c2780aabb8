#![forbid(unsafe_code)]

//! Session keys carried in an `EncryptedKey`.

use crate::cipher::CipherData;
use crate::context::EncContext;
use crate::encrypted::{EncryptedKey, EncryptedReferences, EncryptedTypeFields};
use crate::key_info::KeyInfo;
use crate::method::EncryptionMethod;
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;
use wssec_core::{algorithm, ns, Error, Result};
use wssec_crypto::fixed_time_eq;
use wssec_keys::{
    KeyIdentifierClause, KeyIdentifierClauseKind, KeyWrapMethod, KeyWrappingToken, SecurityToken,
};
use zeroize::Zeroizing;

/// A symmetric key together with its wrapped form.
///
/// The key-encrypting token is shared with whoever owns it. The
/// `EncryptedKey` element and the SHA-1 of the wrapped octets are built
/// on first use and then fixed.
pub struct WrappedKeySecurityToken {
    id: String,
    effective_time: SystemTime,
    key: Zeroizing<Vec<u8>>,
    wrapping_method: KeyWrapMethod,
    wrapping_token: Arc<dyn KeyWrappingToken>,
    wrapping_token_reference: Option<KeyInfo>,
    wrapped_key: Vec<u8>,
    carried_key_name: Option<String>,
    references: EncryptedReferences,
    encrypted_key: OnceLock<EncryptedKey>,
    hash: OnceLock<Vec<u8>>,
}

impl WrappedKeySecurityToken {
    /// Wrap `key` with `wrapping_token`.
    pub fn new(
        id: impl Into<String>,
        key: Vec<u8>,
        wrapping_method: KeyWrapMethod,
        wrapping_token: Arc<dyn KeyWrappingToken>,
        wrapping_token_reference: Option<KeyInfo>,
    ) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidArgument("wrapped key token id is empty".into()));
        }
        let key = Zeroizing::new(key);
        if key.is_empty() {
            return Err(Error::InvalidArgument("wrapped key token key is empty".into()));
        }
        if wrapping_method.algorithm.is_empty() {
            return Err(Error::InvalidArgument("key wrap algorithm is empty".into()));
        }
        let wrapped_key = wrapping_token.wrap_key(&wrapping_method, &key)?;
        tracing::debug!(
            id = %id,
            algorithm = %wrapping_method.algorithm,
            wrapping_token = wrapping_token.id(),
            "wrapped session key"
        );
        Ok(Self {
            id,
            effective_time: SystemTime::now(),
            key,
            wrapping_method,
            wrapping_token,
            wrapping_token_reference,
            wrapped_key,
            carried_key_name: None,
            references: EncryptedReferences::None,
            encrypted_key: OnceLock::new(),
            hash: OnceLock::new(),
        })
    }

    /// Unwrap an incoming `EncryptedKey` with `wrapping_token`.
    pub fn from_encrypted_key(
        encrypted_key: EncryptedKey,
        wrapping_token: Arc<dyn KeyWrappingToken>,
    ) -> Result<Self> {
        let id = encrypted_key.base.id.clone().ok_or_else(|| {
            Error::MissingAttribute(format!("{} on {}", ns::attr::ID, ns::node::ENCRYPTED_KEY))
        })?;
        let method = encrypted_key
            .base
            .encryption_method
            .as_ref()
            .ok_or_else(|| {
                Error::MissingElement(format!(
                    "{} in {}",
                    ns::node::ENCRYPTION_METHOD,
                    ns::node::ENCRYPTED_KEY
                ))
            })?;
        let wrapping_method = KeyWrapMethod::new(method.algorithm.clone()).with_oaep_params(method.oaep());
        let wrapped_key = encrypted_key.base.cipher_data.combined_cipher_value();
        let key = wrapping_token.unwrap_key(&wrapping_method, &wrapped_key)?;
        tracing::debug!(id = %id, algorithm = %wrapping_method.algorithm, "unwrapped session key");

        let token = Self {
            id,
            effective_time: SystemTime::now(),
            key,
            wrapping_method,
            wrapping_token,
            wrapping_token_reference: encrypted_key.base.key_info.clone(),
            wrapped_key,
            carried_key_name: encrypted_key.carried_key_name.clone(),
            references: encrypted_key.references.clone(),
            // Kept as received.
            encrypted_key: OnceLock::from(encrypted_key),
            hash: OnceLock::new(),
        };
        Ok(token)
    }

    /// Name carried in `<CarriedKeyName>` when the context enables it.
    pub fn with_carried_key_name(mut self, name: impl Into<String>) -> Self {
        self.carried_key_name = Some(name.into());
        self
    }

    /// The elements encrypted under this key.
    pub fn with_references(mut self, references: EncryptedReferences) -> Self {
        self.references = references;
        self
    }

    pub fn effective_time(&self) -> SystemTime {
        self.effective_time
    }

    /// The unwrapped session key.
    pub fn symmetric_key(&self) -> &[u8] {
        &self.key
    }

    pub fn wrapped_key(&self) -> &[u8] {
        &self.wrapped_key
    }

    pub fn wrapping_algorithm(&self) -> &str {
        &self.wrapping_method.algorithm
    }

    pub fn wrapping_token(&self) -> &Arc<dyn KeyWrappingToken> {
        &self.wrapping_token
    }

    pub fn wrapping_token_reference(&self) -> Option<&KeyInfo> {
        self.wrapping_token_reference.as_ref()
    }

    pub fn carried_key_name(&self) -> Option<&str> {
        self.carried_key_name.as_deref()
    }

    /// The `EncryptedKey` for this token, built on the first call.
    ///
    /// `CarriedKeyName` is only included when `ctx` enables it; later
    /// calls return the element built first regardless of `ctx`.
    pub fn ensure_encrypted_key_set_up(&self, ctx: &EncContext) -> &EncryptedKey {
        self.encrypted_key.get_or_init(|| {
            let mut method = EncryptionMethod::new(self.wrapping_method.algorithm.clone());
            if self.wrapping_method.algorithm == algorithm::RSA_OAEP {
                method.digest_method = self.wrapping_method.oaep_params.digest_uri.clone();
                method.oaep_params = self.wrapping_method.oaep_params.label.clone();
            }
            let mut base = EncryptedTypeFields::new(CipherData::new(self.wrapped_key.clone()));
            base.id = Some(self.id.clone());
            base.encryption_method = Some(method);
            base.key_info = self.wrapping_token_reference.clone();

            let mut element = EncryptedKey::new(base);
            element.references = self.references.clone();
            if ctx.serialize_carried_key_name {
                element.carried_key_name = self.carried_key_name.clone();
            }
            tracing::trace!(id = %self.id, "built EncryptedKey");
            element
        })
    }

    pub fn is_encrypted_key_set_up(&self) -> bool {
        self.encrypted_key.get().is_some()
    }

    /// SHA-1 over the wrapped key octets.
    pub fn get_hash(&self) -> &[u8] {
        self.hash
            .get_or_init(|| wssec_crypto::digest::sha1(&self.wrapped_key))
    }
}

impl std::fmt::Debug for WrappedKeySecurityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKeySecurityToken")
            .field("id", &self.id)
            .field("wrapping_algorithm", &self.wrapping_method.algorithm)
            .field("wrapping_token", &self.wrapping_token.id())
            .field("key", &format_args!("{} bytes", self.key.len()))
            .field("wrapped_key", &self.wrapped_key.len())
            .finish_non_exhaustive()
    }
}

impl SecurityToken for WrappedKeySecurityToken {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.carried_key_name.as_deref()
    }

    fn matches_key_identifier_clause(&self, clause: &KeyIdentifierClause) -> bool {
        match clause {
            KeyIdentifierClause::EncryptedKeyHash(hash) => fixed_time_eq(hash, self.get_hash()),
            KeyIdentifierClause::LocalId { id, .. } => *id == self.id,
            _ => false,
        }
    }

    fn can_create_key_identifier_clause(&self, kind: KeyIdentifierClauseKind) -> bool {
        matches!(
            kind,
            KeyIdentifierClauseKind::LocalId | KeyIdentifierClauseKind::EncryptedKeyHash
        )
    }

    fn create_key_identifier_clause(&self, kind: KeyIdentifierClauseKind) -> Result<KeyIdentifierClause> {
        match kind {
            KeyIdentifierClauseKind::LocalId => Ok(KeyIdentifierClause::LocalId {
                id: self.id.clone(),
                value_type: Some(algorithm::ENCRYPTED_KEY_TOKEN_TYPE.to_owned()),
            }),
            KeyIdentifierClauseKind::EncryptedKeyHash => {
                Ok(KeyIdentifierClause::EncryptedKeyHash(self.get_hash().to_vec()))
            }
            other => Err(Error::NotSupported(format!(
                "wrapped key token cannot create a {other:?} clause"
            ))),
        }
    }
}
