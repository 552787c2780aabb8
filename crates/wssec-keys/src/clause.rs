#![forbid(unsafe_code)]

//! Key identifier clauses.

use wssec_core::{ns, Error, Result};
use wssec_xml::{XmlReader, XmlSink};

/// One way of pointing at a security token from a `KeyInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyIdentifierClause {
    /// `wsse:Reference URI="#id"`: a token in the same message.
    LocalId {
        id: String,
        value_type: Option<String>,
    },
    /// `ds:KeyName`.
    KeyName(String),
    /// SHA-1 of the octets of an `EncryptedKey`'s cipher value.
    EncryptedKeyHash(Vec<u8>),
    X509IssuerSerial { issuer: String, serial: String },
    /// SHA-1 of a DER certificate.
    X509Thumbprint(Vec<u8>),
    /// `ds:RetrievalMethod`.
    RetrievalMethod { uri: String, r#type: Option<String> },
}

/// Selects the clause a token should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIdentifierClauseKind {
    LocalId,
    KeyName,
    EncryptedKeyHash,
    X509IssuerSerial,
    X509Thumbprint,
}

impl KeyIdentifierClause {
    pub fn local_id(id: impl Into<String>) -> Self {
        Self::LocalId {
            id: id.into(),
            value_type: None,
        }
    }

    pub fn kind(&self) -> Option<KeyIdentifierClauseKind> {
        match self {
            Self::LocalId { .. } => Some(KeyIdentifierClauseKind::LocalId),
            Self::KeyName(_) => Some(KeyIdentifierClauseKind::KeyName),
            Self::EncryptedKeyHash(_) => Some(KeyIdentifierClauseKind::EncryptedKeyHash),
            Self::X509IssuerSerial { .. } => Some(KeyIdentifierClauseKind::X509IssuerSerial),
            Self::X509Thumbprint(_) => Some(KeyIdentifierClauseKind::X509Thumbprint),
            Self::RetrievalMethod { .. } => None,
        }
    }
}

/// Read a `<ds:RetrievalMethod>` the reader is positioned on.
pub fn read_retrieval_method(reader: &mut dyn XmlReader) -> Result<KeyIdentifierClause> {
    if !reader.is_start_element(ns::node::RETRIEVAL_METHOD, ns::DSIG)? {
        return Err(Error::MissingElement(ns::node::RETRIEVAL_METHOD.into()));
    }
    let uri = reader
        .get_attribute(ns::attr::URI, "")
        .ok_or_else(|| {
            Error::MissingAttribute(format!("{} on {}", ns::attr::URI, ns::node::RETRIEVAL_METHOD))
        })?
        .to_owned();
    let r#type = reader.get_attribute(ns::attr::TYPE, "").map(str::to_owned);
    // Transforms below a retrieval method are not interpreted.
    reader.skip()?;
    Ok(KeyIdentifierClause::RetrievalMethod { uri, r#type })
}

pub fn write_retrieval_method(sink: &mut dyn XmlSink, uri: &str, r#type: Option<&str>) -> Result<()> {
    sink.write_start_element(ns::prefix::DSIG, ns::node::RETRIEVAL_METHOD, ns::DSIG)?;
    sink.write_attribute("", ns::attr::URI, "", uri)?;
    if let Some(t) = r#type {
        sink.write_attribute("", ns::attr::TYPE, "", t)?;
    }
    sink.write_end_element()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssec_xml::{StreamReader, XmlTextWriter};

    #[test]
    fn retrieval_method_reads_back() {
        let mut w = XmlTextWriter::new(Vec::new());
        write_retrieval_method(&mut w, "#ek", Some(wssec_core::algorithm::ENCRYPTED_KEY_TYPE)).unwrap();
        let xml = String::from_utf8(w.into_inner().unwrap()).unwrap();

        let mut r = StreamReader::from_str(&xml);
        let clause = read_retrieval_method(&mut r).unwrap();
        assert_eq!(
            clause,
            KeyIdentifierClause::RetrievalMethod {
                uri: "#ek".into(),
                r#type: Some(wssec_core::algorithm::ENCRYPTED_KEY_TYPE.into()),
            }
        );
        assert_eq!(clause.kind(), None);
    }

    #[test]
    fn retrieval_method_needs_uri() {
        let mut r = StreamReader::from_str(
            r#"<ds:RetrievalMethod xmlns:ds="http://www.w3.org/2000/09/xmldsig#"/>"#,
        );
        assert!(matches!(read_retrieval_method(&mut r), Err(Error::MissingAttribute(_))));
    }
}
