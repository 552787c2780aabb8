#![forbid(unsafe_code)]

//! The standalone `<xenc:ReferenceList>` header element.

use wssec_core::{ns, Error, Result};
use wssec_xml::{NodeKind, SecurityElement, XmlReader, XmlSink};

/// Ids of the `EncryptedData` elements a header entry applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceList {
    ids: Vec<String>,
}

impl ReferenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` (without `#`). Adding an id twice is a protocol error.
    pub fn add(&mut self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidArgument("empty data reference id".into()));
        }
        if self.contains(&id) {
            return Err(Error::Protocol(format!(
                "duplicate <{}> '#{id}' in <{}>",
                ns::node::DATA_REFERENCE,
                ns::node::REFERENCE_LIST
            )));
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn read_from(reader: &mut dyn XmlReader) -> Result<Self> {
        reader.move_to_content()?;
        let empty = reader.is_empty_element();
        reader.read_start_element(ns::node::REFERENCE_LIST, ns::ENC)?;
        let mut list = Self::new();
        if !empty {
            while reader.move_to_content()? == NodeKind::Element {
                if !reader.is_start_element(ns::node::DATA_REFERENCE, ns::ENC)? {
                    return Err(Error::Protocol(format!(
                        "unexpected <{}> in <{}>",
                        reader.local_name(),
                        ns::node::REFERENCE_LIST
                    )));
                }
                list.add(read_reference_id(reader)?)?;
            }
            reader.read_end_element()?;
        }
        if list.is_empty() {
            return Err(Error::Protocol(format!(
                "<{}> contains no <{}>",
                ns::node::REFERENCE_LIST,
                ns::node::DATA_REFERENCE
            )));
        }
        Ok(list)
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::InvalidOperation(format!(
                "cannot write an empty <{}>",
                ns::node::REFERENCE_LIST
            )));
        }
        sink.write_start_element(ns::prefix::ENC, ns::node::REFERENCE_LIST, ns::ENC)?;
        write_references(sink, ns::node::DATA_REFERENCE, &self.ids)?;
        sink.write_end_element()
    }
}

impl SecurityElement for ReferenceList {
    fn id(&self) -> Option<&str> {
        None
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        ReferenceList::write_to(self, sink)
    }
}

/// Read a `<DataReference>` or `<KeyReference>` and return its id.
pub(crate) fn read_reference_id(reader: &mut dyn XmlReader) -> Result<String> {
    let local_name = reader.local_name().to_owned();
    let uri = reader
        .get_attribute(ns::attr::URI, "")
        .ok_or_else(|| Error::MissingAttribute(format!("{} on {local_name}", ns::attr::URI)))?;
    let id = match uri.strip_prefix('#') {
        Some(id) if !id.is_empty() => id.to_owned(),
        _ => return Err(Error::InvalidUri(uri.to_owned())),
    };
    // Transforms under a reference are not interpreted.
    reader.skip()?;
    Ok(id)
}

pub(crate) fn write_references(sink: &mut dyn XmlSink, local_name: &str, ids: &[String]) -> Result<()> {
    for id in ids {
        sink.write_start_element(ns::prefix::ENC, local_name, ns::ENC)?;
        sink.write_attribute("", ns::attr::URI, "", &format!("#{id}"))?;
        sink.write_end_element()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wssec_xml::{StreamReader, XmlTextWriter};

    fn read(body: &str) -> Result<ReferenceList> {
        let xml = format!(r#"<e:ReferenceList xmlns:e="http://www.w3.org/2001/04/xmlenc#">{body}</e:ReferenceList>"#);
        let mut r = StreamReader::from_str(&xml);
        ReferenceList::read_from(&mut r)
    }

    #[test]
    fn reads_ids_in_order() {
        let list = read(r##"<e:DataReference URI="#b"/><e:DataReference URI="#a"></e:DataReference>"##).unwrap();
        assert_eq!(list.ids(), ["b", "a"]);
        assert!(list.contains("a"));
        assert!(!list.contains("#a"));
    }

    #[test]
    fn duplicates_are_protocol_errors() {
        let err = read(r##"<e:DataReference URI="#a"/><e:DataReference URI="#a"/>"##).unwrap_err();
        assert!(matches!(err, Error::Protocol(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn must_not_be_empty() {
        assert!(matches!(read(""), Err(Error::Protocol(_))));
        let mut r = StreamReader::from_str(r#"<e:ReferenceList xmlns:e="http://www.w3.org/2001/04/xmlenc#"/>"#);
        assert!(matches!(ReferenceList::read_from(&mut r), Err(Error::Protocol(_))));
        let mut w = XmlTextWriter::new(Vec::new());
        assert!(matches!(ReferenceList::new().write_to(&mut w), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn only_data_references() {
        let err = read(r##"<e:KeyReference URI="#k"/>"##).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn reference_uri_must_be_fragment() {
        assert!(matches!(read(r#"<e:DataReference URI="body"/>"#), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn written_list_reads_back() {
        let mut list = ReferenceList::new();
        list.add("body").unwrap();
        list.add("header-1").unwrap();
        let mut w = XmlTextWriter::new(Vec::new());
        list.write_to(&mut w).unwrap();
        let xml = String::from_utf8(w.into_inner().unwrap()).unwrap();
        let mut r = StreamReader::from_str(&xml);
        assert_eq!(ReferenceList::read_from(&mut r).unwrap(), list);
    }
}
