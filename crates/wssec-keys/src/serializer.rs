#![forbid(unsafe_code)]

//! Reading and writing key identifier clauses.

use crate::clause::{self, KeyIdentifierClause};
use wssec_core::{algorithm, ns, Error, Result};
use wssec_xml::{XmlReader, XmlSink};

/// Maps between [`KeyIdentifierClause`]s and their XML forms.
pub trait KeyIdentifierSerializer: Send + Sync {
    /// Read the clause at the reader's current element.
    ///
    /// Returns `Ok(None)` without consuming anything when the element is
    /// not a clause this serializer knows.
    fn read_clause(&self, reader: &mut dyn XmlReader) -> Result<Option<KeyIdentifierClause>>;

    fn write_clause(&self, sink: &mut dyn XmlSink, clause: &KeyIdentifierClause) -> Result<()>;
}

/// The WS-Security 1.1 clause forms.
///
/// * `ds:KeyName`
/// * `wsse:SecurityTokenReference` holding a `wsse:Reference` or a
///   base64 `wsse:KeyIdentifier` (EncryptedKeySHA1, ThumbprintSHA1)
/// * `ds:X509Data/ds:X509IssuerSerial`
/// * `ds:RetrievalMethod`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardKeyIdentifierSerializer;

impl StandardKeyIdentifierSerializer {
    fn read_security_token_reference(
        &self,
        reader: &mut dyn XmlReader,
    ) -> Result<KeyIdentifierClause> {
        reader.read_start_element(ns::node::SECURITY_TOKEN_REFERENCE, ns::WSSE)?;

        let clause = if reader.is_start_element(ns::node::WSSE_REFERENCE, ns::WSSE)? {
            let uri = reader.get_attribute(ns::attr::URI, "").ok_or_else(|| {
                Error::MissingAttribute(format!("{} on {}", ns::attr::URI, ns::node::WSSE_REFERENCE))
            })?;
            let id = match uri.strip_prefix('#') {
                Some(id) if !id.is_empty() => id.to_owned(),
                _ => return Err(Error::InvalidUri(uri.to_owned())),
            };
            let value_type = reader.get_attribute(ns::attr::VALUE_TYPE, "").map(str::to_owned);
            reader.skip()?;
            KeyIdentifierClause::LocalId { id, value_type }
        } else if reader.is_start_element(ns::node::KEY_IDENTIFIER, ns::WSSE)? {
            if let Some(encoding) = reader.get_attribute(ns::attr::ENCODING_TYPE, "") {
                if encoding != algorithm::BASE64_ENCODING_TYPE {
                    return Err(Error::NotSupported(format!(
                        "key identifier encoding type '{encoding}'"
                    )));
                }
            }
            let value_type = reader
                .get_attribute(ns::attr::VALUE_TYPE, "")
                .ok_or_else(|| {
                    Error::MissingAttribute(format!(
                        "{} on {}",
                        ns::attr::VALUE_TYPE,
                        ns::node::KEY_IDENTIFIER
                    ))
                })?
                .to_owned();
            let value = reader.read_element_content_as_base64(ns::node::KEY_IDENTIFIER, ns::WSSE)?;
            match value_type.as_str() {
                algorithm::ENCRYPTED_KEY_SHA1_VALUE_TYPE => KeyIdentifierClause::EncryptedKeyHash(value),
                algorithm::X509_THUMBPRINT_SHA1_VALUE_TYPE => KeyIdentifierClause::X509Thumbprint(value),
                other => {
                    return Err(Error::NotSupported(format!("key identifier value type '{other}'")))
                }
            }
        } else {
            return Err(Error::Protocol(format!(
                "<{}> must contain <{}> or <{}>, found <{}>",
                ns::node::SECURITY_TOKEN_REFERENCE,
                ns::node::WSSE_REFERENCE,
                ns::node::KEY_IDENTIFIER,
                reader.local_name()
            )));
        };

        reader.read_end_element()?;
        Ok(clause)
    }

    fn read_x509_data(&self, reader: &mut dyn XmlReader) -> Result<KeyIdentifierClause> {
        reader.read_start_element(ns::node::X509_DATA, ns::DSIG)?;
        if !reader.is_start_element(ns::node::X509_ISSUER_SERIAL, ns::DSIG)? {
            return Err(Error::NotSupported(format!(
                "<{}> content <{}>",
                ns::node::X509_DATA,
                reader.local_name()
            )));
        }
        reader.read_start_element(ns::node::X509_ISSUER_SERIAL, ns::DSIG)?;
        let issuer = reader.read_element_string(ns::node::X509_ISSUER_NAME, ns::DSIG)?;
        let serial = reader.read_element_string(ns::node::X509_SERIAL_NUMBER, ns::DSIG)?;
        reader.read_end_element()?;
        reader.read_end_element()?;
        Ok(KeyIdentifierClause::X509IssuerSerial {
            issuer: issuer.trim().to_owned(),
            serial: serial.trim().to_owned(),
        })
    }

    fn write_key_identifier(
        &self,
        sink: &mut dyn XmlSink,
        value_type: &str,
        token_type: Option<&str>,
        value: &[u8],
    ) -> Result<()> {
        sink.write_start_element(ns::prefix::WSSE, ns::node::SECURITY_TOKEN_REFERENCE, ns::WSSE)?;
        if let Some(token_type) = token_type {
            sink.write_attribute(ns::prefix::WSSE11, ns::attr::TOKEN_TYPE, ns::WSSE11, token_type)?;
        }
        sink.write_start_element(ns::prefix::WSSE, ns::node::KEY_IDENTIFIER, ns::WSSE)?;
        sink.write_attribute("", ns::attr::VALUE_TYPE, "", value_type)?;
        sink.write_attribute("", ns::attr::ENCODING_TYPE, "", algorithm::BASE64_ENCODING_TYPE)?;
        sink.write_base64(value)?;
        sink.write_end_element()?;
        sink.write_end_element()
    }
}

impl KeyIdentifierSerializer for StandardKeyIdentifierSerializer {
    fn read_clause(&self, reader: &mut dyn XmlReader) -> Result<Option<KeyIdentifierClause>> {
        if !reader.is_start_of_any_element()? {
            return Ok(None);
        }
        let clause = match (reader.namespace_uri(), reader.local_name()) {
            (ns::DSIG, ns::node::KEY_NAME) => {
                let name = reader.read_element_string(ns::node::KEY_NAME, ns::DSIG)?;
                KeyIdentifierClause::KeyName(name.trim().to_owned())
            }
            (ns::WSSE, ns::node::SECURITY_TOKEN_REFERENCE) => {
                self.read_security_token_reference(reader)?
            }
            (ns::DSIG, ns::node::X509_DATA) => self.read_x509_data(reader)?,
            (ns::DSIG, ns::node::RETRIEVAL_METHOD) => clause::read_retrieval_method(reader)?,
            _ => return Ok(None),
        };
        tracing::trace!(?clause, "read key identifier clause");
        Ok(Some(clause))
    }

    fn write_clause(&self, sink: &mut dyn XmlSink, clause: &KeyIdentifierClause) -> Result<()> {
        match clause {
            KeyIdentifierClause::LocalId { id, value_type } => {
                sink.write_start_element(
                    ns::prefix::WSSE,
                    ns::node::SECURITY_TOKEN_REFERENCE,
                    ns::WSSE,
                )?;
                sink.write_start_element(ns::prefix::WSSE, ns::node::WSSE_REFERENCE, ns::WSSE)?;
                sink.write_attribute("", ns::attr::URI, "", &format!("#{id}"))?;
                if let Some(value_type) = value_type {
                    sink.write_attribute("", ns::attr::VALUE_TYPE, "", value_type)?;
                }
                sink.write_end_element()?;
                sink.write_end_element()
            }
            KeyIdentifierClause::KeyName(name) => {
                sink.write_element_string(ns::prefix::DSIG, ns::node::KEY_NAME, ns::DSIG, name)
            }
            KeyIdentifierClause::EncryptedKeyHash(hash) => self.write_key_identifier(
                sink,
                algorithm::ENCRYPTED_KEY_SHA1_VALUE_TYPE,
                Some(algorithm::ENCRYPTED_KEY_TOKEN_TYPE),
                hash,
            ),
            KeyIdentifierClause::X509Thumbprint(thumbprint) => self.write_key_identifier(
                sink,
                algorithm::X509_THUMBPRINT_SHA1_VALUE_TYPE,
                None,
                thumbprint,
            ),
            KeyIdentifierClause::X509IssuerSerial { issuer, serial } => {
                sink.write_start_element(ns::prefix::DSIG, ns::node::X509_DATA, ns::DSIG)?;
                sink.write_start_element(ns::prefix::DSIG, ns::node::X509_ISSUER_SERIAL, ns::DSIG)?;
                sink.write_element_string(
                    ns::prefix::DSIG,
                    ns::node::X509_ISSUER_NAME,
                    ns::DSIG,
                    issuer,
                )?;
                sink.write_element_string(
                    ns::prefix::DSIG,
                    ns::node::X509_SERIAL_NUMBER,
                    ns::DSIG,
                    serial,
                )?;
                sink.write_end_element()?;
                sink.write_end_element()
            }
            KeyIdentifierClause::RetrievalMethod { uri, r#type } => {
                clause::write_retrieval_method(sink, uri, r#type.as_deref())
            }
        }
    }
}
