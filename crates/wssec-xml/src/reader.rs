#![forbid(unsafe_code)]

//! The forward-only reader abstraction.
//!
//! Only the operations the security core actually needs are modelled:
//! advancing, inspecting the current node, namespace lookup, and a handful
//! of provided helpers for reading element content.

use crate::writer::XmlSink;
use base64::Engine;
use wssec_core::{ns, Error, Result};

/// The kind of node a reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Before the first `read` or after the end of input.
    None,
    Element,
    EndElement,
    Text,
    CData,
    Comment,
    Whitespace,
}

impl NodeKind {
    /// Text-like nodes that make up element content.
    pub fn is_content(self) -> bool {
        matches!(self, Self::Text | Self::CData | Self::Whitespace)
    }
}

/// An attribute of the current element, namespace declarations included.
///
/// Declarations use the `xmlns` namespace: `xmlns:p="u"` has prefix `xmlns`
/// and local name `p`, the default declaration has an empty prefix and
/// local name `xmlns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub prefix: String,
    pub local_name: String,
    pub namespace_uri: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(
        prefix: impl Into<String>,
        local_name: impl Into<String>,
        namespace_uri: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            local_name: local_name.into(),
            namespace_uri: namespace_uri.into(),
            value: value.into(),
        }
    }

    pub fn is_namespace_declaration(&self) -> bool {
        self.namespace_uri == ns::XMLNS
    }

    /// The prefix bound by this attribute if it is a namespace declaration.
    pub fn declared_prefix(&self) -> Option<&str> {
        if !self.is_namespace_declaration() {
            None
        } else if self.prefix == "xmlns" {
            Some(&self.local_name)
        } else {
            Some("")
        }
    }

    /// Bytes charged against a buffering quota.
    pub fn size(&self) -> usize {
        self.prefix.len() + self.local_name.len() + self.namespace_uri.len() + self.value.len()
    }
}

/// A forward-only, single pass XML reader.
///
/// Empty elements are reported once as [`NodeKind::Element`] with
/// `is_empty_element() == true` and have no matching end node.
pub trait XmlReader {
    /// Advance to the next node. Returns `false` at the end of input.
    fn read(&mut self) -> Result<bool>;

    fn node_kind(&self) -> NodeKind;

    /// Element nesting depth of the current node (document element is 0).
    fn depth(&self) -> usize;

    fn prefix(&self) -> &str;

    fn local_name(&self) -> &str;

    fn namespace_uri(&self) -> &str;

    /// Text value of text-like nodes, empty otherwise.
    fn value(&self) -> &str;

    fn is_empty_element(&self) -> bool;

    /// Attributes of the current element; empty for other nodes.
    fn attributes(&self) -> &[XmlAttribute];

    fn lookup_namespace(&self, prefix: &str) -> Option<&str>;

    /// Every namespace binding in scope at the current node, sorted by prefix.
    fn in_scope_namespaces(&self) -> Vec<(String, String)>;

    /// Whether [`XmlReader::write_canonical_subtree`] is available.
    fn supports_canonicalization(&self) -> bool {
        false
    }

    /// Stream the current element subtree into `sink` without surfacing
    /// each node through the cursor. Leaves the reader after the subtree.
    fn write_canonical_subtree(&mut self, _sink: &mut dyn XmlSink) -> Result<()> {
        Err(Error::NotSupported(
            "reader has no native canonicalization support".into(),
        ))
    }

    // ── Provided helpers ─────────────────────────────────────────────

    /// Skip whitespace and comments. Returns the kind of the node reached.
    fn move_to_content(&mut self) -> Result<NodeKind> {
        loop {
            match self.node_kind() {
                NodeKind::Whitespace | NodeKind::Comment => {
                    if !self.read()? {
                        return Ok(NodeKind::None);
                    }
                }
                NodeKind::None => {
                    if !self.read()? {
                        return Ok(NodeKind::None);
                    }
                }
                kind => return Ok(kind),
            }
        }
    }

    fn is_start_element(&mut self, local_name: &str, namespace_uri: &str) -> Result<bool> {
        Ok(self.move_to_content()? == NodeKind::Element
            && self.local_name() == local_name
            && self.namespace_uri() == namespace_uri)
    }

    fn is_start_of_any_element(&mut self) -> Result<bool> {
        Ok(self.move_to_content()? == NodeKind::Element)
    }

    /// Consume the start tag of the expected element.
    fn read_start_element(&mut self, local_name: &str, namespace_uri: &str) -> Result<()> {
        if !self.is_start_element(local_name, namespace_uri)? {
            return Err(Error::Protocol(format!(
                "expected element <{local_name}> in namespace '{namespace_uri}', found {:?} <{}> in '{}'",
                self.node_kind(),
                self.local_name(),
                self.namespace_uri()
            )));
        }
        self.read()?;
        Ok(())
    }

    /// Consume an end tag, skipping any whitespace before it.
    fn read_end_element(&mut self) -> Result<()> {
        if self.move_to_content()? != NodeKind::EndElement {
            return Err(Error::Protocol(format!(
                "expected end element, found {:?} <{}>",
                self.node_kind(),
                self.local_name()
            )));
        }
        self.read()?;
        Ok(())
    }

    fn get_attribute(&self, local_name: &str, namespace_uri: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|a| a.local_name == local_name && a.namespace_uri == namespace_uri)
            .map(|a| a.value.as_str())
    }

    /// Concatenate adjacent text, CDATA and whitespace nodes.
    fn read_content_as_string(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.node_kind() {
                NodeKind::Text | NodeKind::CData | NodeKind::Whitespace => {
                    out.push_str(self.value());
                }
                NodeKind::Comment => {}
                _ => break,
            }
            if !self.read()? {
                break;
            }
        }
        Ok(out)
    }

    /// Read and decode base64 element content.
    fn read_content_as_base64(&mut self) -> Result<Vec<u8>> {
        let text = self.read_content_as_string()?;
        decode_base64(&text)
    }

    /// Read and decode hex element content.
    fn read_content_as_bin_hex(&mut self) -> Result<Vec<u8>> {
        let text = self.read_content_as_string()?;
        decode_bin_hex(&text)
    }

    /// Read a simple text-only element.
    fn read_element_string(&mut self, local_name: &str, namespace_uri: &str) -> Result<String> {
        if !self.is_start_element(local_name, namespace_uri)? {
            return Err(Error::Protocol(format!(
                "expected element <{local_name}> in namespace '{namespace_uri}'"
            )));
        }
        if self.is_empty_element() {
            self.read()?;
            return Ok(String::new());
        }
        self.read()?;
        let text = self.read_content_as_string()?;
        self.read_end_element()?;
        Ok(text)
    }

    /// Read an element whose content is base64 binary.
    fn read_element_content_as_base64(
        &mut self,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<Vec<u8>> {
        if !self.is_start_element(local_name, namespace_uri)? {
            return Err(Error::Protocol(format!(
                "expected element <{local_name}> in namespace '{namespace_uri}'"
            )));
        }
        if self.is_empty_element() {
            self.read()?;
            return Ok(Vec::new());
        }
        self.read()?;
        let bytes = self.read_content_as_base64()?;
        self.read_end_element()?;
        Ok(bytes)
    }

    /// Skip the current node; for an element, its entire subtree.
    fn skip(&mut self) -> Result<()> {
        if self.node_kind() == NodeKind::Element && !self.is_empty_element() {
            let depth = self.depth();
            loop {
                if !self.read()? {
                    return Err(Error::XmlParse("unexpected end of input in skip".into()));
                }
                if self.node_kind() == NodeKind::EndElement && self.depth() == depth {
                    break;
                }
            }
        }
        self.read()?;
        Ok(())
    }
}

impl<R: XmlReader + ?Sized> XmlReader for &mut R {
    fn read(&mut self) -> Result<bool> {
        (**self).read()
    }

    fn node_kind(&self) -> NodeKind {
        (**self).node_kind()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn prefix(&self) -> &str {
        (**self).prefix()
    }

    fn local_name(&self) -> &str {
        (**self).local_name()
    }

    fn namespace_uri(&self) -> &str {
        (**self).namespace_uri()
    }

    fn value(&self) -> &str {
        (**self).value()
    }

    fn is_empty_element(&self) -> bool {
        (**self).is_empty_element()
    }

    fn attributes(&self) -> &[XmlAttribute] {
        (**self).attributes()
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        (**self).lookup_namespace(prefix)
    }

    fn in_scope_namespaces(&self) -> Vec<(String, String)> {
        (**self).in_scope_namespaces()
    }

    fn supports_canonicalization(&self) -> bool {
        (**self).supports_canonicalization()
    }

    fn write_canonical_subtree(&mut self, sink: &mut dyn XmlSink) -> Result<()> {
        (**self).write_canonical_subtree(sink)
    }

    fn read_content_as_base64(&mut self) -> Result<Vec<u8>> {
        (**self).read_content_as_base64()
    }

    fn read_content_as_bin_hex(&mut self) -> Result<Vec<u8>> {
        (**self).read_content_as_bin_hex()
    }
}

/// Write the node the reader is positioned on, and for an element its
/// whole subtree, into `sink`. The reader ends up after the subtree.
pub fn write_current_subtree(reader: &mut dyn XmlReader, sink: &mut dyn XmlSink) -> Result<()> {
    if reader.node_kind() != NodeKind::Element {
        write_current_node(reader, sink)?;
        reader.read()?;
        return Ok(());
    }
    let start_depth = reader.depth();
    loop {
        write_current_node(reader, sink)?;
        let finished = match reader.node_kind() {
            NodeKind::Element => reader.is_empty_element() && reader.depth() == start_depth,
            NodeKind::EndElement => reader.depth() == start_depth,
            _ => false,
        };
        let more = reader.read()?;
        if finished {
            return Ok(());
        }
        if !more {
            return Err(Error::XmlParse("unexpected end of input inside element".into()));
        }
    }
}

/// Write a single node (an element start includes its attributes).
pub fn write_current_node(reader: &dyn XmlReader, sink: &mut dyn XmlSink) -> Result<()> {
    match reader.node_kind() {
        NodeKind::Element => {
            sink.write_start_element(reader.prefix(), reader.local_name(), reader.namespace_uri())?;
            for a in reader.attributes() {
                sink.write_attribute(&a.prefix, &a.local_name, &a.namespace_uri, &a.value)?;
            }
            if reader.is_empty_element() {
                sink.write_end_element()?;
            }
        }
        NodeKind::EndElement => sink.write_end_element()?,
        NodeKind::Text => sink.write_text(reader.value())?,
        NodeKind::CData => sink.write_cdata(reader.value())?,
        NodeKind::Comment => sink.write_comment(reader.value())?,
        NodeKind::Whitespace => sink.write_whitespace(reader.value())?,
        NodeKind::None => {}
    }
    Ok(())
}

/// Decode base64 text, ignoring embedded whitespace.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(e.to_string()))
}

/// Decode hex text, ignoring embedded whitespace.
pub fn decode_bin_hex(text: &str) -> Result<Vec<u8>> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(clean).map_err(|e| Error::Protocol(format!("invalid binhex content: {e}")))
}
