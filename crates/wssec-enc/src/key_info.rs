#![forbid(unsafe_code)]

//! `<ds:KeyInfo>`.

use wssec_core::{ns, Result};
use wssec_keys::clause::read_retrieval_method;
use wssec_keys::{KeyIdentifierClause, KeyIdentifierSerializer};
use wssec_xml::{NodeKind, XmlReader, XmlSink};

/// The clauses of a `KeyInfo`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    pub id: Option<String>,
    pub clauses: Vec<KeyIdentifierClause>,
}

impl KeyInfo {
    pub fn new(clause: KeyIdentifierClause) -> Self {
        Self {
            id: None,
            clauses: vec![clause],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn first(&self) -> Option<&KeyIdentifierClause> {
        self.clauses.first()
    }

    /// Read a `<ds:KeyInfo>`. Elements the serializer does not know, other
    /// than `ds:RetrievalMethod`, are skipped.
    pub fn read_from(reader: &mut dyn XmlReader, serializer: &dyn KeyIdentifierSerializer) -> Result<Self> {
        reader.move_to_content()?;
        let mut key_info = Self {
            id: reader.get_attribute(ns::attr::ID, "").map(str::to_owned),
            clauses: Vec::new(),
        };
        let empty = reader.is_empty_element();
        reader.read_start_element(ns::node::KEY_INFO, ns::DSIG)?;
        if empty {
            return Ok(key_info);
        }

        while reader.move_to_content()? == NodeKind::Element {
            if let Some(clause) = serializer.read_clause(reader)? {
                key_info.clauses.push(clause);
            } else if reader.is_start_element(ns::node::RETRIEVAL_METHOD, ns::DSIG)? {
                key_info.clauses.push(read_retrieval_method(reader)?);
            } else {
                tracing::debug!(
                    element = reader.local_name(),
                    namespace = reader.namespace_uri(),
                    "skipping unrecognized KeyInfo content"
                );
                reader.skip()?;
            }
        }
        reader.read_end_element()?;
        Ok(key_info)
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink, serializer: &dyn KeyIdentifierSerializer) -> Result<()> {
        sink.write_start_element(ns::prefix::DSIG, ns::node::KEY_INFO, ns::DSIG)?;
        if let Some(id) = &self.id {
            sink.write_attribute("", ns::attr::ID, "", id)?;
        }
        for clause in &self.clauses {
            serializer.write_clause(sink, clause)?;
        }
        sink.write_end_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssec_keys::StandardKeyIdentifierSerializer;
    use wssec_xml::StreamReader;

    /// Knows nothing, so everything goes through the fallback paths.
    struct NoClauses;

    impl KeyIdentifierSerializer for NoClauses {
        fn read_clause(&self, _reader: &mut dyn XmlReader) -> Result<Option<KeyIdentifierClause>> {
            Ok(None)
        }

        fn write_clause(&self, _sink: &mut dyn XmlSink, _clause: &KeyIdentifierClause) -> Result<()> {
            Ok(())
        }
    }

    const KEY_INFO: &str = concat!(
        r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#" Id="ki">"#,
        r#"<ds:KeyValue><ds:RSAKeyValue/></ds:KeyValue>"#,
        r#"<ds:KeyName>alice</ds:KeyName>"#,
        r##"<ds:RetrievalMethod URI="#ek"/>"##,
        r#"</ds:KeyInfo>"#
    );

    #[test]
    fn known_clauses_and_skipped_content() {
        let mut r = StreamReader::from_str(KEY_INFO);
        let ki = KeyInfo::read_from(&mut r, &StandardKeyIdentifierSerializer).unwrap();
        assert_eq!(ki.id.as_deref(), Some("ki"));
        assert_eq!(
            ki.clauses,
            [
                KeyIdentifierClause::KeyName("alice".into()),
                KeyIdentifierClause::RetrievalMethod {
                    uri: "#ek".into(),
                    r#type: None
                },
            ]
        );
    }

    #[test]
    fn retrieval_method_fallback() {
        let mut r = StreamReader::from_str(KEY_INFO);
        let ki = KeyInfo::read_from(&mut r, &NoClauses).unwrap();
        assert_eq!(ki.clauses.len(), 1);
        assert!(matches!(ki.first(), Some(KeyIdentifierClause::RetrievalMethod { .. })));
    }

    #[test]
    fn empty_key_info() {
        let mut r = StreamReader::from_str(r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"/>"#);
        let ki = KeyInfo::read_from(&mut r, &StandardKeyIdentifierSerializer).unwrap();
        assert!(ki.is_empty());
        assert_eq!(r.move_to_content().unwrap(), NodeKind::None);
    }
}
