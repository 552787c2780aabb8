#![forbid(unsafe_code)]

//! XML output.
//!
//! [`XmlSink`] is the push interface every serializer in the workspace
//! writes to. Canonicalization is just another sink. [`XmlTextWriter`] is
//! the plain UTF-8 sink built on quick-xml's `Writer`.

use base64::Engine;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use wssec_core::{ns, Error, Result};

/// A push-style XML consumer.
///
/// Calls must nest: attributes only directly after a start element, every
/// start element eventually closed with `write_end_element`.
pub trait XmlSink {
    fn write_start_element(&mut self, prefix: &str, local_name: &str, namespace_uri: &str)
        -> Result<()>;

    /// Write an attribute of the element just started. Namespace
    /// declarations are attributes in the `xmlns` namespace.
    fn write_attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        value: &str,
    ) -> Result<()>;

    fn write_text(&mut self, text: &str) -> Result<()>;

    fn write_cdata(&mut self, text: &str) -> Result<()>;

    fn write_comment(&mut self, text: &str) -> Result<()>;

    fn write_whitespace(&mut self, text: &str) -> Result<()>;

    fn write_end_element(&mut self) -> Result<()>;

    // ── Provided helpers ─────────────────────────────────────────────

    /// `<prefix:local>text</prefix:local>`
    fn write_element_string(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        text: &str,
    ) -> Result<()> {
        self.write_start_element(prefix, local_name, namespace_uri)?;
        self.write_text(text)?;
        self.write_end_element()
    }

    fn write_base64(&mut self, bytes: &[u8]) -> Result<()> {
        let text = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.write_text(&text)
    }

    /// Declare `prefix` (empty for the default namespace).
    fn write_xmlns_attribute(&mut self, prefix: &str, namespace_uri: &str) -> Result<()> {
        if prefix.is_empty() {
            self.write_attribute("", "xmlns", ns::XMLNS, namespace_uri)
        } else {
            self.write_attribute("xmlns", prefix, ns::XMLNS, namespace_uri)
        }
    }
}

// ── XmlTextWriter ────────────────────────────────────────────────────

struct PendingStart {
    name: String,
    prefix: String,
    namespace_uri: String,
    /// Declarations given explicitly, in order; later ones win.
    declarations: Vec<(String, String)>,
    attributes: Vec<(String, String, String)>, // (qname, namespace, value)
    attribute_prefixes: Vec<String>,
}

struct Frame {
    name: String,
    bindings: Vec<(String, String)>,
}

/// UTF-8 XML writer.
///
/// Namespace prefixes used by elements or attributes that are not bound
/// in scope are declared automatically on the element that uses them.
pub struct XmlTextWriter<W: Write> {
    writer: quick_xml::Writer<W>,
    pending: Option<PendingStart>,
    stack: Vec<Frame>,
}

impl<W: Write> XmlTextWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: quick_xml::Writer::new(inner),
            pending: None,
            stack: Vec::new(),
        }
    }

    /// Finish writing and hand back the underlying output.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush_pending(false)?;
        if let Some(frame) = self.stack.last() {
            return Err(Error::XmlWrite(format!("element <{}> left open", frame.name)));
        }
        Ok(self.writer.into_inner())
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(ns::XML);
        }
        self.stack
            .iter()
            .rev()
            .flat_map(|f| f.bindings.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::XmlWrite(e.to_string()))
    }

    fn flush_pending(&mut self, empty: bool) -> Result<()> {
        let Some(p) = self.pending.take() else {
            return Ok(());
        };

        let mut bindings = p.declarations.clone();
        let mut required: Vec<(String, String)> = vec![(p.prefix.clone(), p.namespace_uri.clone())];
        for (prefix, (_, namespace, _)) in p.attribute_prefixes.iter().zip(&p.attributes) {
            if !prefix.is_empty() {
                required.push((prefix.clone(), namespace.clone()));
            }
        }
        for (prefix, uri) in required {
            if prefix == "xml" {
                continue;
            }
            let bound = bindings
                .iter()
                .rev()
                .find(|(bp, _)| *bp == prefix)
                .map(|(_, u)| u.as_str())
                .or_else(|| self.lookup(&prefix))
                .unwrap_or("");
            if bound != uri {
                bindings.retain(|(bp, _)| *bp != prefix);
                bindings.push((prefix, uri));
            }
        }

        let mut start = BytesStart::new(p.name.as_str());
        for (prefix, uri) in &bindings {
            let key = if prefix.is_empty() {
                "xmlns".to_owned()
            } else {
                format!("xmlns:{prefix}")
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        for (qname, _, value) in &p.attributes {
            start.push_attribute((qname.as_str(), value.as_str()));
        }

        if empty {
            self.emit(Event::Empty(start))?;
        } else {
            self.emit(Event::Start(start))?;
            self.stack.push(Frame {
                name: p.name,
                bindings,
            });
        }
        Ok(())
    }
}

impl<W: Write> XmlSink for XmlTextWriter<W> {
    fn write_start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<()> {
        self.flush_pending(false)?;
        self.pending = Some(PendingStart {
            name: crate::qualified_name(prefix, local_name),
            prefix: prefix.to_owned(),
            namespace_uri: namespace_uri.to_owned(),
            declarations: Vec::new(),
            attributes: Vec::new(),
            attribute_prefixes: Vec::new(),
        });
        Ok(())
    }

    fn write_attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        value: &str,
    ) -> Result<()> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(Error::XmlWrite(format!(
                "attribute '{local_name}' written outside a start tag"
            )));
        };
        if namespace_uri == ns::XMLNS {
            let declared = if prefix == "xmlns" { local_name } else { "" };
            pending.declarations.retain(|(p, _)| p != declared);
            pending
                .declarations
                .push((declared.to_owned(), value.to_owned()));
            return Ok(());
        }
        pending.attributes.push((
            crate::qualified_name(prefix, local_name),
            namespace_uri.to_owned(),
            value.to_owned(),
        ));
        pending.attribute_prefixes.push(prefix.to_owned());
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.flush_pending(false)?;
        self.emit(Event::Text(BytesText::new(text)))
    }

    fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.flush_pending(false)?;
        self.emit(Event::CData(BytesCData::new(text)))
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.flush_pending(false)?;
        self.emit(Event::Comment(BytesText::from_escaped(text)))
    }

    fn write_whitespace(&mut self, text: &str) -> Result<()> {
        self.write_text(text)
    }

    fn write_end_element(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return self.flush_pending(true);
        }
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::XmlWrite("end element without open element".into()))?;
        self.emit(Event::End(BytesEnd::new(frame.name.as_str())))
    }
}
