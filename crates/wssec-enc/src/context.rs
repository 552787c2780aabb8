#![forbid(unsafe_code)]

//! Encryption context: how encrypted elements are read and written.

use std::io::BufRead;
use std::sync::Arc;
use wssec_core::Result;
use wssec_keys::{KeyIdentifierSerializer, StandardKeyIdentifierSerializer};
use wssec_xml::{ReaderQuotas, StreamReader, XmlReader, XmlSink};

use crate::encrypted::EncryptedType;

/// Settings for XML-Encryption processing.
#[derive(Clone)]
pub struct EncContext {
    /// Reads and writes the clauses inside `KeyInfo`.
    pub serializer: Arc<dyn KeyIdentifierSerializer>,
    pub quotas: ReaderQuotas,
    /// Emit `<CarriedKeyName>` on `EncryptedKey`s built from wrapped key
    /// tokens.
    pub serialize_carried_key_name: bool,
}

impl EncContext {
    pub fn new() -> Self {
        Self {
            serializer: Arc::new(StandardKeyIdentifierSerializer),
            quotas: ReaderQuotas::default(),
            serialize_carried_key_name: false,
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn KeyIdentifierSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_quotas(mut self, quotas: ReaderQuotas) -> Self {
        self.quotas = quotas;
        self
    }

    pub fn with_carried_key_name(mut self, enabled: bool) -> Self {
        self.serialize_carried_key_name = enabled;
        self
    }

    /// A reader over `source` bound by this context's quotas.
    pub fn reader<R: BufRead>(&self, source: R) -> StreamReader<R> {
        StreamReader::with_quotas(source, self.quotas)
    }

    pub fn read_encrypted_type(&self, reader: &mut dyn XmlReader) -> Result<EncryptedType> {
        EncryptedType::read_from(reader, self.serializer.as_ref())
    }

    pub fn write_encrypted_type(&self, element: &EncryptedType, sink: &mut dyn XmlSink) -> Result<()> {
        element.write_with(sink, self.serializer.as_ref())
    }
}

impl Default for EncContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncContext")
            .field("quotas", &self.quotas)
            .field("serialize_carried_key_name", &self.serialize_carried_key_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssec_core::Error;
    use wssec_xml::XmlTextWriter;

    #[test]
    fn quotas_apply_to_readers() {
        let ctx = EncContext::new().with_quotas(ReaderQuotas {
            max_depth: 2,
            ..ReaderQuotas::default()
        });
        let xml = concat!(
            r#"<e:EncryptedData xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r#"</e:EncryptedData>"#
        );
        let mut r = ctx.reader(xml.as_bytes());
        assert!(matches!(ctx.read_encrypted_type(&mut r), Err(Error::QuotaExceeded(_))));

        let relaxed = EncContext::default();
        let mut r = relaxed.reader(xml.as_bytes());
        let element = relaxed.read_encrypted_type(&mut r).unwrap();
        let mut w = XmlTextWriter::new(Vec::new());
        relaxed.write_encrypted_type(&element, &mut w).unwrap();
        assert!(String::from_utf8(w.into_inner().unwrap()).unwrap().contains("AAAA"));
    }

    #[test]
    fn carried_key_name_is_off_by_default() {
        assert!(!EncContext::default().serialize_carried_key_name);
        assert!(EncContext::new().with_carried_key_name(true).serialize_carried_key_name);
    }
}
