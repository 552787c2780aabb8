#![forbid(unsafe_code)]

//! Security token traits.

use crate::clause::{KeyIdentifierClause, KeyIdentifierClauseKind};
use wssec_core::{Error, Result};
use wssec_crypto::keytransport::OaepParams;
use zeroize::Zeroizing;

/// Something a `KeyInfo` can point at.
pub trait SecurityToken: Send + Sync {
    /// The token's `wsu:Id`.
    fn id(&self) -> &str;

    /// Optional `ds:KeyName`.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Whether `clause` identifies this token.
    ///
    /// The default handles local ids and key names; tokens with
    /// content-derived identities extend it.
    fn matches_key_identifier_clause(&self, clause: &KeyIdentifierClause) -> bool {
        match clause {
            KeyIdentifierClause::LocalId { id, .. } => id == self.id(),
            KeyIdentifierClause::KeyName(name) => self.name() == Some(name.as_str()),
            _ => false,
        }
    }

    fn can_create_key_identifier_clause(&self, kind: KeyIdentifierClauseKind) -> bool {
        match kind {
            KeyIdentifierClauseKind::LocalId => true,
            KeyIdentifierClauseKind::KeyName => self.name().is_some(),
            _ => false,
        }
    }

    fn create_key_identifier_clause(&self, kind: KeyIdentifierClauseKind) -> Result<KeyIdentifierClause> {
        match kind {
            KeyIdentifierClauseKind::LocalId => Ok(KeyIdentifierClause::local_id(self.id())),
            KeyIdentifierClauseKind::KeyName => self
                .name()
                .map(|n| KeyIdentifierClause::KeyName(n.to_owned()))
                .ok_or_else(|| Error::InvalidOperation(format!("token '{}' has no key name", self.id()))),
            other => Err(Error::NotSupported(format!(
                "token '{}' cannot create a {other:?} clause",
                self.id()
            ))),
        }
    }
}

/// A wrapping algorithm URI and its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyWrapMethod {
    pub algorithm: String,
    /// Only used by RSA-OAEP.
    pub oaep_params: OaepParams,
}

impl KeyWrapMethod {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            oaep_params: OaepParams::default(),
        }
    }

    pub fn with_oaep_params(mut self, params: OaepParams) -> Self {
        self.oaep_params = params;
        self
    }
}

/// A token whose key can encrypt other keys.
pub trait KeyWrappingToken: SecurityToken {
    fn is_supported_wrap_algorithm(&self, algorithm: &str) -> bool;

    fn wrap_key(&self, method: &KeyWrapMethod, key: &[u8]) -> Result<Vec<u8>>;

    fn unwrap_key(&self, method: &KeyWrapMethod, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    impl SecurityToken for Named {
        fn id(&self) -> &str {
            "tok-1"
        }

        fn name(&self) -> Option<&str> {
            Some("alice")
        }
    }

    struct Anonymous;

    impl SecurityToken for Anonymous {
        fn id(&self) -> &str {
            "tok-2"
        }
    }

    #[test]
    fn default_matching() {
        assert!(Named.matches_key_identifier_clause(&KeyIdentifierClause::local_id("tok-1")));
        assert!(!Named.matches_key_identifier_clause(&KeyIdentifierClause::local_id("tok-2")));
        assert!(Named.matches_key_identifier_clause(&KeyIdentifierClause::KeyName("alice".into())));
        assert!(!Anonymous.matches_key_identifier_clause(&KeyIdentifierClause::KeyName("alice".into())));
        assert!(!Named.matches_key_identifier_clause(&KeyIdentifierClause::EncryptedKeyHash(vec![0; 20])));
    }

    #[test]
    fn default_clause_creation() {
        assert_eq!(
            Named.create_key_identifier_clause(KeyIdentifierClauseKind::KeyName).unwrap(),
            KeyIdentifierClause::KeyName("alice".into())
        );
        assert!(!Anonymous.can_create_key_identifier_clause(KeyIdentifierClauseKind::KeyName));
        assert!(matches!(
            Anonymous.create_key_identifier_clause(KeyIdentifierClauseKind::KeyName),
            Err(Error::InvalidOperation(_))
        ));
        assert!(matches!(
            Anonymous.create_key_identifier_clause(KeyIdentifierClauseKind::X509Thumbprint),
            Err(Error::NotSupported(_))
        ));
    }
}
