#![forbid(unsafe_code)]

//! A streaming [`XmlReader`] over quick-xml.

use crate::reader::{write_current_node, write_current_subtree, NodeKind, XmlAttribute, XmlReader};
use crate::writer::XmlSink;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;
use wssec_core::{ns, Error, Result};

/// Limits enforced while reading. Exceeding any of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderQuotas {
    /// Maximum element nesting depth.
    pub max_depth: usize,
    /// Maximum length of a single text node or attribute value.
    pub max_string_content_length: usize,
    /// Maximum number of bytes a recording reader may buffer.
    pub max_buffer_size: usize,
}

impl Default for ReaderQuotas {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_string_content_length: 1 << 20,
            max_buffer_size: 1 << 20,
        }
    }
}

/// An element start with its name and attributes resolved.
struct BoundElement {
    prefix: String,
    local_name: String,
    namespace_uri: String,
    attributes: Vec<XmlAttribute>,
}

impl BoundElement {
    fn write_start(&self, sink: &mut dyn XmlSink) -> Result<()> {
        sink.write_start_element(&self.prefix, &self.local_name, &self.namespace_uri)?;
        for a in &self.attributes {
            sink.write_attribute(&a.prefix, &a.local_name, &a.namespace_uri, &a.value)?;
        }
        Ok(())
    }
}

/// Forward-only reader resolving namespaces as it goes.
pub struct StreamReader<R: BufRead> {
    inner: quick_xml::Reader<R>,
    buf: Vec<u8>,
    quotas: ReaderQuotas,

    kind: NodeKind,
    depth: usize,
    prefix: String,
    local_name: String,
    namespace_uri: String,
    value: String,
    is_empty: bool,
    attributes: Vec<XmlAttribute>,

    /// Declarations per open element; the innermost scope is last.
    scopes: Vec<Vec<(String, String)>>,
    /// Element names of open elements, for end tag resolution.
    open: Vec<(String, String, String)>,
    pop_scope: bool,
    eof: bool,
}

impl<'a> StreamReader<&'a [u8]> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> StreamReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_quotas(source, ReaderQuotas::default())
    }

    pub fn with_quotas(source: R, quotas: ReaderQuotas) -> Self {
        let mut inner = quick_xml::Reader::from_reader(source);
        inner.config_mut().trim_text(false);
        Self {
            inner,
            buf: Vec::new(),
            quotas,
            kind: NodeKind::None,
            depth: 0,
            prefix: String::new(),
            local_name: String::new(),
            namespace_uri: String::new(),
            value: String::new(),
            is_empty: false,
            attributes: Vec::new(),
            scopes: Vec::new(),
            open: Vec::new(),
            pop_scope: false,
            eof: false,
        }
    }

    pub fn quotas(&self) -> &ReaderQuotas {
        &self.quotas
    }

    fn resolve(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => Some(ns::XML),
            "xmlns" => Some(ns::XMLNS),
            _ => self
                .scopes
                .iter()
                .rev()
                .flat_map(|s| s.iter().rev())
                .find(|(p, _)| p == prefix)
                .map(|(_, u)| u.as_str())
                // No default namespace in scope means no namespace.
                .or(if prefix.is_empty() { Some("") } else { None }),
        }
    }

    fn check_length(&self, len: usize) -> Result<()> {
        if len > self.quotas.max_string_content_length {
            tracing::warn!(len, "string content quota exceeded");
            return Err(Error::QuotaExceeded(format!(
                "string content of {len} bytes exceeds the limit of {}",
                self.quotas.max_string_content_length
            )));
        }
        Ok(())
    }

    fn reset_node(&mut self) {
        self.prefix.clear();
        self.local_name.clear();
        self.namespace_uri.clear();
        self.value.clear();
        self.is_empty = false;
        self.attributes.clear();
    }

    /// Push the element's namespace scope and resolve its name and
    /// attributes.
    fn bind_element(&mut self, e: &BytesStart<'_>) -> Result<BoundElement> {
        if self.open.len() >= self.quotas.max_depth {
            tracing::warn!(max_depth = self.quotas.max_depth, "element depth quota exceeded");
            return Err(Error::QuotaExceeded(format!(
                "element depth exceeds the limit of {}",
                self.quotas.max_depth
            )));
        }
        let qname = std::str::from_utf8(e.name().as_ref())
            .map_err(|err| Error::XmlParse(err.to_string()))?
            .to_owned();

        // Declarations first so they are in scope for the element itself.
        let mut scope = Vec::new();
        let mut raw = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::XmlParse(err.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| Error::XmlParse(err.to_string()))?
                .to_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::XmlParse(err.to_string()))?
                .into_owned();
            self.check_length(value.len())?;
            if key == "xmlns" {
                scope.push((String::new(), value.clone()));
            } else if let Some(p) = key.strip_prefix("xmlns:") {
                scope.push((p.to_owned(), value.clone()));
            }
            raw.push((key, value));
        }
        self.scopes.push(scope);

        let (prefix, local) = crate::split_qname(&qname);
        let namespace_uri = self
            .resolve(prefix)
            .ok_or_else(|| Error::XmlParse(format!("undeclared namespace prefix '{prefix}'")))?
            .to_owned();

        let mut attributes = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let attribute = if key == "xmlns" {
                XmlAttribute::new("", "xmlns", ns::XMLNS, value)
            } else {
                let (ap, al) = crate::split_qname(&key);
                let ans = if ap.is_empty() {
                    String::new()
                } else {
                    self.resolve(ap)
                        .ok_or_else(|| {
                            Error::XmlParse(format!("undeclared namespace prefix '{ap}'"))
                        })?
                        .to_owned()
                };
                XmlAttribute::new(ap, al, ans, value)
            };
            attributes.push(attribute);
        }
        Ok(BoundElement {
            prefix: prefix.to_owned(),
            local_name: local.to_owned(),
            namespace_uri,
            attributes,
        })
    }

    fn start_element(&mut self, e: &BytesStart<'_>, is_empty: bool) -> Result<()> {
        let element = self.bind_element(e)?;
        self.kind = NodeKind::Element;
        self.depth = self.open.len();
        self.prefix = element.prefix;
        self.local_name = element.local_name;
        self.namespace_uri = element.namespace_uri;
        self.is_empty = is_empty;
        self.attributes = element.attributes;
        if is_empty {
            self.pop_scope = true;
        } else {
            self.open.push((
                self.prefix.clone(),
                self.local_name.clone(),
                self.namespace_uri.clone(),
            ));
        }
        Ok(())
    }

    /// Copy the content and end tag of the current (non-empty) element
    /// straight from the parser into `sink`. Cursor fields are left
    /// untouched until the caller reads past the subtree.
    fn copy_element_content(&mut self, sink: &mut dyn XmlSink) -> Result<()> {
        let stop = self.open.len().saturating_sub(1);
        loop {
            let mut buf = std::mem::take(&mut self.buf);
            buf.clear();
            let event = self
                .inner
                .read_event_into(&mut buf)
                .map_err(|e| Error::XmlParse(e.to_string()))?;
            let mut done = false;
            match event {
                Event::Start(e) => {
                    let element = self.bind_element(&e)?;
                    element.write_start(sink)?;
                    self.open.push((element.prefix, element.local_name, element.namespace_uri));
                }
                Event::Empty(e) => {
                    let element = self.bind_element(&e)?;
                    element.write_start(sink)?;
                    sink.write_end_element()?;
                    self.scopes.pop();
                }
                Event::End(_) => {
                    self.open
                        .pop()
                        .ok_or_else(|| Error::XmlParse("unbalanced end tag".into()))?;
                    self.scopes.pop();
                    sink.write_end_element()?;
                    done = self.open.len() == stop;
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| Error::XmlParse(err.to_string()))?;
                    self.check_length(text.len())?;
                    if text.chars().all(char::is_whitespace) {
                        if !text.is_empty() {
                            sink.write_whitespace(&text)?;
                        }
                    } else {
                        sink.write_text(&text)?;
                    }
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(&e).map_err(|err| Error::XmlParse(err.to_string()))?;
                    self.check_length(text.len())?;
                    sink.write_cdata(text)?;
                }
                Event::Comment(e) => {
                    let text = std::str::from_utf8(&e).map_err(|err| Error::XmlParse(err.to_string()))?;
                    self.check_length(text.len())?;
                    sink.write_comment(text)?;
                }
                Event::Eof => {
                    return Err(Error::XmlParse("unexpected end of input inside element".into()));
                }
                _ => {}
            }
            self.buf = buf;
            if done {
                return Ok(());
            }
        }
    }

    fn text_node(&mut self, text: String, kind: NodeKind) -> Result<()> {
        self.check_length(text.len())?;
        self.kind = if kind == NodeKind::Text && text.chars().all(char::is_whitespace) {
            NodeKind::Whitespace
        } else {
            kind
        };
        self.depth = self.open.len();
        self.value = text;
        Ok(())
    }
}

impl<R: BufRead> XmlReader for StreamReader<R> {
    fn read(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.pop_scope {
            self.scopes.pop();
            self.pop_scope = false;
        }
        self.reset_node();

        loop {
            let mut buf = std::mem::take(&mut self.buf);
            buf.clear();
            let event = self
                .inner
                .read_event_into(&mut buf)
                .map_err(|e| Error::XmlParse(e.to_string()))?;
            let handled = match event {
                Event::Start(e) => {
                    self.start_element(&e, false)?;
                    true
                }
                Event::Empty(e) => {
                    self.start_element(&e, true)?;
                    true
                }
                Event::End(_) => {
                    let (prefix, local, namespace) = self
                        .open
                        .pop()
                        .ok_or_else(|| Error::XmlParse("unbalanced end tag".into()))?;
                    self.kind = NodeKind::EndElement;
                    self.depth = self.open.len();
                    self.prefix = prefix;
                    self.local_name = local;
                    self.namespace_uri = namespace;
                    self.pop_scope = true;
                    true
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlParse(err.to_string()))?
                        .into_owned();
                    if text.is_empty() {
                        false
                    } else {
                        self.text_node(text, NodeKind::Text)?;
                        true
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|err| Error::XmlParse(err.to_string()))?;
                    self.text_node(text, NodeKind::CData)?;
                    true
                }
                Event::Comment(e) => {
                    let text = std::str::from_utf8(&e)
                        .map_err(|err| Error::XmlParse(err.to_string()))?
                        .to_owned();
                    self.text_node(text, NodeKind::Comment)?;
                    true
                }
                Event::Eof => {
                    if !self.open.is_empty() {
                        return Err(Error::XmlParse("unexpected end of document".into()));
                    }
                    self.kind = NodeKind::None;
                    self.depth = 0;
                    self.eof = true;
                    return Ok(false);
                }
                // Declarations, processing instructions and DOCTYPE are
                // not part of any signed subtree.
                _ => false,
            };
            self.buf = buf;
            if handled {
                return Ok(true);
            }
        }
    }

    fn node_kind(&self) -> NodeKind {
        self.kind
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn local_name(&self) -> &str {
        &self.local_name
    }

    fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn is_empty_element(&self) -> bool {
        self.is_empty
    }

    fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.resolve(prefix)
    }

    fn in_scope_namespaces(&self) -> Vec<(String, String)> {
        let mut map = std::collections::BTreeMap::new();
        for scope in &self.scopes {
            for (p, u) in scope {
                map.insert(p.clone(), u.clone());
            }
        }
        map.into_iter().filter(|(p, u)| !(p.is_empty() && u.is_empty())).collect()
    }

    fn supports_canonicalization(&self) -> bool {
        true
    }

    fn write_canonical_subtree(&mut self, sink: &mut dyn XmlSink) -> Result<()> {
        if self.kind != NodeKind::Element {
            return write_current_subtree(self, sink);
        }
        write_current_node(&*self, sink)?;
        if !self.is_empty {
            self.copy_element_content(sink)?;
        }
        self.read()?;
        Ok(())
    }
}
