#![forbid(unsafe_code)]

//! `<xenc:EncryptedKey>` and `<xenc:EncryptedData>`.
//!
//! Both share the `EncryptedType` content model:
//!
//! ```text
//! EncryptionMethod? KeyInfo? CipherData <extensions>
//! ```
//!
//! `EncryptedKey` extends it with `ReferenceList?` and `CarriedKeyName?`.

use crate::cipher::CipherData;
use crate::key_info::KeyInfo;
use crate::method::EncryptionMethod;
use crate::reference_list::{read_reference_id, write_references};
use wssec_core::{ns, Error, Result};
use wssec_keys::{KeyIdentifierSerializer, StandardKeyIdentifierSerializer};
use wssec_xml::{NodeKind, SecurityElement, XmlReader, XmlSink};

/// Fields common to every encrypted type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedTypeFields {
    pub id: Option<String>,
    pub r#type: Option<String>,
    pub mime_type: Option<String>,
    pub encoding: Option<String>,
    pub encryption_method: Option<EncryptionMethod>,
    pub key_info: Option<KeyInfo>,
    pub cipher_data: CipherData,
}

impl EncryptedTypeFields {
    pub fn new(cipher_data: CipherData) -> Self {
        Self {
            cipher_data,
            ..Self::default()
        }
    }

    fn read_attributes(reader: &dyn XmlReader) -> Self {
        let attr = |name: &str| reader.get_attribute(name, "").map(str::to_owned);
        Self {
            id: attr(ns::attr::ID),
            r#type: attr(ns::attr::TYPE),
            mime_type: attr(ns::attr::MIME_TYPE),
            encoding: attr(ns::attr::ENCODING),
            ..Self::default()
        }
    }

    /// Read `EncryptionMethod? KeyInfo? CipherData`.
    fn read_content(
        &mut self,
        reader: &mut dyn XmlReader,
        serializer: &dyn KeyIdentifierSerializer,
        element: &str,
    ) -> Result<()> {
        if reader.is_start_element(ns::node::ENCRYPTION_METHOD, ns::ENC)? {
            self.encryption_method = Some(EncryptionMethod::read_from(reader)?);
        }
        if reader.is_start_element(ns::node::KEY_INFO, ns::DSIG)? {
            self.key_info = Some(KeyInfo::read_from(reader, serializer)?);
        }
        if !reader.is_start_element(ns::node::CIPHER_DATA, ns::ENC)? {
            return Err(missing_cipher_data(element, reader));
        }
        self.cipher_data = CipherData::read_from(reader)?;
        Ok(())
    }

    fn write_attributes(&self, sink: &mut dyn XmlSink) -> Result<()> {
        for (name, value) in [
            (ns::attr::ID, &self.id),
            (ns::attr::TYPE, &self.r#type),
            (ns::attr::MIME_TYPE, &self.mime_type),
            (ns::attr::ENCODING, &self.encoding),
        ] {
            if let Some(value) = value {
                sink.write_attribute("", name, "", value)?;
            }
        }
        Ok(())
    }

    fn write_content(&self, sink: &mut dyn XmlSink, serializer: &dyn KeyIdentifierSerializer) -> Result<()> {
        if let Some(method) = &self.encryption_method {
            method.write_to(sink)?;
        }
        if let Some(key_info) = &self.key_info {
            key_info.write_to(sink, serializer)?;
        }
        self.cipher_data.write_to(sink)
    }
}

fn missing_cipher_data(element: &str, reader: &dyn XmlReader) -> Error {
    let found = match reader.node_kind() {
        NodeKind::Element => format!("<{}>", reader.local_name()),
        kind => format!("{kind:?}"),
    };
    Error::Protocol(format!(
        "<{element}> requires <{}>, found {found}",
        ns::node::CIPHER_DATA
    ))
}

/// Consume trailing extension elements up to the end tag. Base content
/// showing up again here is out of order.
fn skip_extensions(reader: &mut dyn XmlReader, element: &str) -> Result<()> {
    while reader.move_to_content()? == NodeKind::Element {
        let misplaced = matches!(
            (reader.namespace_uri(), reader.local_name()),
            (ns::ENC, ns::node::CIPHER_DATA)
                | (ns::ENC, ns::node::ENCRYPTION_METHOD)
                | (ns::DSIG, ns::node::KEY_INFO)
        );
        if misplaced {
            return Err(Error::Protocol(format!(
                "<{}> out of order in <{element}>; exactly one <{}> must come last",
                reader.local_name(),
                ns::node::CIPHER_DATA
            )));
        }
        tracing::debug!(element, child = reader.local_name(), "skipping extension element");
        reader.skip()?;
    }
    reader.read_end_element()
}

/// Start an encrypted element: position on it, take its attributes and
/// step into its content.
fn open_element(reader: &mut dyn XmlReader, element: &str) -> Result<EncryptedTypeFields> {
    if !reader.is_start_element(element, ns::ENC)? {
        return Err(Error::MissingElement(element.into()));
    }
    let fields = EncryptedTypeFields::read_attributes(reader);
    let empty = reader.is_empty_element();
    reader.read()?;
    if empty {
        return Err(Error::Protocol(format!(
            "<{element}> requires <{}>",
            ns::node::CIPHER_DATA
        )));
    }
    Ok(fields)
}

/// The `ReferenceList` of an `EncryptedKey`: one kind of reference only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EncryptedReferences {
    #[default]
    None,
    Data(Vec<String>),
    Key(Vec<String>),
}

impl EncryptedReferences {
    pub fn data_references(&self) -> &[String] {
        match self {
            Self::Data(ids) => ids,
            _ => &[],
        }
    }

    pub fn key_references(&self) -> &[String] {
        match self {
            Self::Key(ids) => ids,
            _ => &[],
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn read_from(reader: &mut dyn XmlReader) -> Result<Self> {
        let empty = reader.is_empty_element();
        reader.read_start_element(ns::node::REFERENCE_LIST, ns::ENC)?;
        let mut data = Vec::new();
        let mut keys = Vec::new();
        if !empty {
            while reader.move_to_content()? == NodeKind::Element {
                let is_data = match (reader.namespace_uri(), reader.local_name()) {
                    (ns::ENC, ns::node::DATA_REFERENCE) => true,
                    (ns::ENC, ns::node::KEY_REFERENCE) => false,
                    _ => {
                        return Err(Error::Protocol(format!(
                            "unexpected <{}> in <{}>",
                            reader.local_name(),
                            ns::node::REFERENCE_LIST
                        )))
                    }
                };
                if (is_data && !keys.is_empty()) || (!is_data && !data.is_empty()) {
                    let (found, committed) = if is_data {
                        (ns::node::DATA_REFERENCE, ns::node::KEY_REFERENCE)
                    } else {
                        (ns::node::KEY_REFERENCE, ns::node::DATA_REFERENCE)
                    };
                    return Err(Error::Protocol(format!(
                        "<{}> of <{}> mixes reference kinds: <{found}> after <{committed}>",
                        ns::node::REFERENCE_LIST,
                        ns::node::ENCRYPTED_KEY
                    )));
                }
                let id = read_reference_id(reader)?;
                let (kind, ids) = if is_data {
                    (ns::node::DATA_REFERENCE, &mut data)
                } else {
                    (ns::node::KEY_REFERENCE, &mut keys)
                };
                if ids.contains(&id) {
                    return Err(Error::Protocol(format!(
                        "duplicate <{kind}> '#{id}' in <{}>",
                        ns::node::REFERENCE_LIST
                    )));
                }
                ids.push(id);
            }
            reader.read_end_element()?;
        }
        match (data.is_empty(), keys.is_empty()) {
            (false, _) => Ok(Self::Data(data)),
            (true, false) => Ok(Self::Key(keys)),
            (true, true) => Err(Error::Protocol(format!(
                "<{}> of <{}> contains no references",
                ns::node::REFERENCE_LIST,
                ns::node::ENCRYPTED_KEY
            ))),
        }
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        let (local_name, ids) = match self {
            Self::None => return Ok(()),
            Self::Data(ids) => (ns::node::DATA_REFERENCE, ids),
            Self::Key(ids) => (ns::node::KEY_REFERENCE, ids),
        };
        sink.write_start_element(ns::prefix::ENC, ns::node::REFERENCE_LIST, ns::ENC)?;
        write_references(sink, local_name, ids)?;
        sink.write_end_element()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedKey {
    pub base: EncryptedTypeFields,
    pub recipient: Option<String>,
    pub carried_key_name: Option<String>,
    pub references: EncryptedReferences,
}

impl EncryptedKey {
    pub fn new(base: EncryptedTypeFields) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn read_from(reader: &mut dyn XmlReader, serializer: &dyn KeyIdentifierSerializer) -> Result<Self> {
        let recipient = if reader.is_start_element(ns::node::ENCRYPTED_KEY, ns::ENC)? {
            reader.get_attribute(ns::attr::RECIPIENT, "").map(str::to_owned)
        } else {
            None
        };
        let mut base = open_element(reader, ns::node::ENCRYPTED_KEY)?;
        base.read_content(reader, serializer, ns::node::ENCRYPTED_KEY)?;

        let references = if reader.is_start_element(ns::node::REFERENCE_LIST, ns::ENC)? {
            EncryptedReferences::read_from(reader)?
        } else {
            EncryptedReferences::None
        };
        let carried_key_name = if reader.is_start_element(ns::node::CARRIED_KEY_NAME, ns::ENC)? {
            Some(reader.read_element_string(ns::node::CARRIED_KEY_NAME, ns::ENC)?)
        } else {
            None
        };
        skip_extensions(reader, ns::node::ENCRYPTED_KEY)?;

        Ok(Self {
            base,
            recipient,
            carried_key_name,
            references,
        })
    }

    pub fn write_with(&self, sink: &mut dyn XmlSink, serializer: &dyn KeyIdentifierSerializer) -> Result<()> {
        sink.write_start_element(ns::prefix::ENC, ns::node::ENCRYPTED_KEY, ns::ENC)?;
        self.base.write_attributes(sink)?;
        if let Some(recipient) = &self.recipient {
            sink.write_attribute("", ns::attr::RECIPIENT, "", recipient)?;
        }
        self.base.write_content(sink, serializer)?;
        self.references.write_to(sink)?;
        if let Some(name) = &self.carried_key_name {
            sink.write_element_string(ns::prefix::ENC, ns::node::CARRIED_KEY_NAME, ns::ENC, name)?;
        }
        sink.write_end_element()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedData {
    pub base: EncryptedTypeFields,
}

impl EncryptedData {
    pub fn new(base: EncryptedTypeFields) -> Self {
        Self { base }
    }

    pub fn read_from(reader: &mut dyn XmlReader, serializer: &dyn KeyIdentifierSerializer) -> Result<Self> {
        let mut base = open_element(reader, ns::node::ENCRYPTED_DATA)?;
        base.read_content(reader, serializer, ns::node::ENCRYPTED_DATA)?;
        // EncryptionProperties are not interpreted.
        skip_extensions(reader, ns::node::ENCRYPTED_DATA)?;
        Ok(Self { base })
    }

    pub fn write_with(&self, sink: &mut dyn XmlSink, serializer: &dyn KeyIdentifierSerializer) -> Result<()> {
        sink.write_start_element(ns::prefix::ENC, ns::node::ENCRYPTED_DATA, ns::ENC)?;
        self.base.write_attributes(sink)?;
        self.base.write_content(sink, serializer)?;
        sink.write_end_element()
    }
}

/// Either kind of encrypted element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedType {
    Key(EncryptedKey),
    Data(EncryptedData),
}

impl EncryptedType {
    pub fn base(&self) -> &EncryptedTypeFields {
        match self {
            Self::Key(key) => &key.base,
            Self::Data(data) => &data.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut EncryptedTypeFields {
        match self {
            Self::Key(key) => &mut key.base,
            Self::Data(data) => &mut data.base,
        }
    }

    /// Read whichever encrypted element the reader is positioned on.
    pub fn read_from(reader: &mut dyn XmlReader, serializer: &dyn KeyIdentifierSerializer) -> Result<Self> {
        if reader.is_start_element(ns::node::ENCRYPTED_KEY, ns::ENC)? {
            EncryptedKey::read_from(reader, serializer).map(Self::Key)
        } else if reader.is_start_element(ns::node::ENCRYPTED_DATA, ns::ENC)? {
            EncryptedData::read_from(reader, serializer).map(Self::Data)
        } else {
            Err(Error::Protocol(format!(
                "expected <{}> or <{}>, found <{}>",
                ns::node::ENCRYPTED_KEY,
                ns::node::ENCRYPTED_DATA,
                reader.local_name()
            )))
        }
    }

    pub fn write_with(&self, sink: &mut dyn XmlSink, serializer: &dyn KeyIdentifierSerializer) -> Result<()> {
        match self {
            Self::Key(key) => key.write_with(sink, serializer),
            Self::Data(data) => data.write_with(sink, serializer),
        }
    }
}

// As security elements, key identifiers are written in the standard
// WS-Security forms.

impl SecurityElement for EncryptedKey {
    fn id(&self) -> Option<&str> {
        self.base.id.as_deref()
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        self.write_with(sink, &StandardKeyIdentifierSerializer)
    }
}

impl SecurityElement for EncryptedData {
    fn id(&self) -> Option<&str> {
        self.base.id.as_deref()
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        self.write_with(sink, &StandardKeyIdentifierSerializer)
    }
}

impl SecurityElement for EncryptedType {
    fn id(&self) -> Option<&str> {
        self.base().id.as_deref()
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        self.write_with(sink, &StandardKeyIdentifierSerializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssec_core::algorithm;
    use wssec_keys::KeyIdentifierClause;
    use wssec_xml::{StreamReader, XmlTextWriter};

    const ENCRYPTED_KEY: &str = r##"<e:EncryptedKey xmlns:e="http://www.w3.org/2001/04/xmlenc#" Id="ek-1" Recipient="service">
  <e:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p">
    <DigestMethod xmlns="http://www.w3.org/2000/09/xmldsig#" Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/>
  </e:EncryptionMethod>
  <KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#">
    <o:SecurityTokenReference xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <o:KeyIdentifier ValueType="http://docs.oasis-open.org/wss/oasis-wss-soap-message-security-1.1#ThumbprintSHA1" EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">qZk+NkcGgWq6PiVxeFDCbJzQ2J0=</o:KeyIdentifier>
    </o:SecurityTokenReference>
  </KeyInfo>
  <e:CipherData>
    <e:CipherValue>AAECAwQFBgc=</e:CipherValue>
  </e:CipherData>
  <e:ReferenceList>
    <e:DataReference URI="#body"/>
    <e:DataReference URI="#header"/>
  </e:ReferenceList>
  <e:CarriedKeyName>session</e:CarriedKeyName>
</e:EncryptedKey>"##;

    fn read_key(xml: &str) -> Result<EncryptedKey> {
        let mut r = StreamReader::from_str(xml);
        EncryptedKey::read_from(&mut r, &StandardKeyIdentifierSerializer)
    }

    fn write(element: &dyn SecurityElement) -> String {
        let mut w = XmlTextWriter::new(Vec::new());
        element.write_to(&mut w).unwrap();
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    fn child_names(xml: &str) -> Vec<String> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        doc.root_element()
            .children()
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name().to_owned())
            .collect()
    }

    #[test]
    fn reads_encrypted_key() {
        let key = read_key(ENCRYPTED_KEY).unwrap();
        assert_eq!(key.base.id.as_deref(), Some("ek-1"));
        assert_eq!(key.recipient.as_deref(), Some("service"));
        let method = key.base.encryption_method.as_ref().unwrap();
        assert_eq!(method.algorithm, algorithm::RSA_OAEP);
        assert_eq!(method.digest_method.as_deref(), Some(algorithm::SHA1));
        assert_eq!(
            key.base.key_info.as_ref().unwrap().clauses,
            [KeyIdentifierClause::X509Thumbprint(
                hex::decode("a9993e364706816aba3e25717850c26c9cd0d89d").unwrap()
            )]
        );
        assert_eq!(key.base.cipher_data.cipher_text, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(key.references.data_references(), ["body", "header"]);
        assert!(key.references.key_references().is_empty());
        assert_eq!(key.carried_key_name.as_deref(), Some("session"));
    }

    #[test]
    fn encrypted_key_round_trip() {
        let key = read_key(ENCRYPTED_KEY).unwrap();
        let xml = write(&key);
        assert_eq!(
            child_names(&xml),
            ["EncryptionMethod", "KeyInfo", "CipherData", "ReferenceList", "CarriedKeyName"]
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(doc.root_element().tag_name().namespace(), Some(ns::ENC));
        assert_eq!(doc.root_element().attribute("Recipient"), Some("service"));
        assert_eq!(read_key(&xml).unwrap(), key);
    }

    #[test]
    fn mixed_reference_kinds_are_rejected() {
        let xml = concat!(
            r#"<e:EncryptedKey xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r##"<e:ReferenceList><e:DataReference URI="#body"/><e:KeyReference URI="#k"/></e:ReferenceList>"##,
            r#"</e:EncryptedKey>"#
        );
        let err = read_key(xml).unwrap_err();
        assert!(
            matches!(err, Error::Protocol(ref m) if m.contains("<KeyReference> after <DataReference>")),
            "{err}"
        );
    }

    #[test]
    fn duplicate_references_are_rejected() {
        let xml = ENCRYPTED_KEY.replace("#header", "#body");
        let err = read_key(&xml).unwrap_err();
        assert!(
            matches!(err, Error::Protocol(ref m) if m.contains("duplicate <DataReference> '#body'")),
            "{err}"
        );

        let xml = concat!(
            r#"<e:EncryptedKey xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r##"<e:ReferenceList><e:KeyReference URI="#k"/><e:KeyReference URI="#k"/></e:ReferenceList>"##,
            r#"</e:EncryptedKey>"#
        );
        assert!(matches!(read_key(xml), Err(Error::Protocol(_))));
    }

    #[test]
    fn key_references_round_trip() {
        let mut key = EncryptedKey::new(EncryptedTypeFields::new(CipherData::new(vec![1; 24])));
        key.references = EncryptedReferences::Key(vec!["k1".into(), "k2".into()]);
        let xml = write(&key);
        assert!(xml.contains(r##"<e:KeyReference URI="#k1"/>"##), "{xml}");
        assert_eq!(read_key(&xml).unwrap(), key);
    }

    #[test]
    fn cipher_data_is_required() {
        let xml = concat!(
            r#"<e:EncryptedKey xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<e:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#kw-aes128"/>"#,
            r#"</e:EncryptedKey>"#
        );
        assert!(matches!(read_key(xml), Err(Error::Protocol(ref m)) if m.contains("CipherData")));
        let empty = r#"<e:EncryptedKey xmlns:e="http://www.w3.org/2001/04/xmlenc#"/>"#;
        assert!(matches!(read_key(empty), Err(Error::Protocol(_))));
    }

    #[test]
    fn base_content_order_is_enforced() {
        let after = concat!(
            r#"<e:EncryptedData xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r#"<e:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes128-cbc"/>"#,
            r#"</e:EncryptedData>"#
        );
        let twice = concat!(
            r#"<e:EncryptedData xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r#"</e:EncryptedData>"#
        );
        let swapped = concat!(
            r#"<e:EncryptedData xmlns:e="http://www.w3.org/2001/04/xmlenc#">"#,
            r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"/>"#,
            r#"<e:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes128-cbc"/>"#,
            r#"<e:CipherData><e:CipherValue>AAAA</e:CipherValue></e:CipherData>"#,
            r#"</e:EncryptedData>"#
        );
        for xml in [after, twice, swapped] {
            let mut r = StreamReader::from_str(xml);
            let err = EncryptedData::read_from(&mut r, &StandardKeyIdentifierSerializer).unwrap_err();
            assert!(matches!(err, Error::Protocol(_)), "{xml}: {err}");
        }
    }

    #[test]
    fn encrypted_data_dispatch_and_round_trip() {
        let xml = concat!(
            r#"<e:EncryptedData xmlns:e="http://www.w3.org/2001/04/xmlenc#" Id="body-enc" "#,
            r#"Type="http://www.w3.org/2001/04/xmlenc#Content" MimeType="text/xml">"#,
            r#"<e:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes256-cbc"/>"#,
            r#"<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#,
            r#"<o:SecurityTokenReference xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">"#,
            r##"<o:Reference URI="#ek-1"/></o:SecurityTokenReference></ds:KeyInfo>"##,
            r#"<e:CipherData><e:CipherValue>AAECAw==</e:CipherValue></e:CipherData>"#,
            r#"<e:EncryptionProperties/>"#,
            r#"</e:EncryptedData>"#
        );
        let mut r = StreamReader::from_str(xml);
        let element = EncryptedType::read_from(&mut r, &StandardKeyIdentifierSerializer).unwrap();
        assert!(matches!(element, EncryptedType::Data(_)));
        assert_eq!(SecurityElement::id(&element), Some("body-enc"));
        assert_eq!(element.base().r#type.as_deref(), Some(algorithm::ENC_TYPE_CONTENT));
        assert_eq!(
            element.base().key_info.as_ref().and_then(KeyInfo::first),
            Some(&KeyIdentifierClause::local_id("ek-1"))
        );

        let written = write(&element);
        assert_eq!(child_names(&written), ["EncryptionMethod", "KeyInfo", "CipherData"]);
        let mut r = StreamReader::from_str(&written);
        assert_eq!(
            EncryptedType::read_from(&mut r, &StandardKeyIdentifierSerializer).unwrap(),
            element
        );
    }

    #[test]
    fn other_elements_are_not_encrypted_types() {
        let mut r = StreamReader::from_str("<Body/>");
        assert!(matches!(
            EncryptedType::read_from(&mut r, &StandardKeyIdentifierSerializer),
            Err(Error::Protocol(_))
        ));
    }
}
