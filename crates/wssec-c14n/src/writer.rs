#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 as an [`XmlSink`].
//!
//! Only visibly utilized namespace declarations are output: the prefix of
//! the element name, prefixes of its attributes, and prefixes named in the
//! InclusiveNamespaces PrefixList (`#default` for the default namespace).
//! A declaration is omitted when the nearest output ancestor already
//! rendered the same binding.

use crate::escape;
use crate::render::{Attr, NsDecl};
use std::io::Write;
use wssec_core::{ns, Error, Result};
use wssec_xml::{qualified_name, XmlSink};

struct PendingElement {
    prefix: String,
    local_name: String,
    namespace_uri: String,
    declarations: Vec<(String, String)>,
    attributes: Vec<(String, String, String, String)>, // prefix, local, ns, value
}

struct OpenElement {
    qname: String,
    declared: Vec<(String, String)>,
    rendered: Vec<NsDecl>,
}

/// Streams canonical bytes for one element subtree into `out`.
pub struct CanonicalWriter<W: Write> {
    out: W,
    with_comments: bool,
    /// Normalized PrefixList; "" stands for `#default`.
    inclusive_prefixes: Vec<String>,
    /// Bindings of the apex's ancestors. They act as a wrapper scope that
    /// is consulted for inclusive prefixes and never rendered itself.
    inherited: Vec<(String, String)>,
    pending: Option<PendingElement>,
    stack: Vec<OpenElement>,
    scratch: Vec<u8>,
}

impl<W: Write> CanonicalWriter<W> {
    pub fn new(out: W, with_comments: bool) -> Self {
        Self {
            out,
            with_comments,
            inclusive_prefixes: Vec::new(),
            inherited: Vec::new(),
            pending: None,
            stack: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Set the InclusiveNamespaces PrefixList.
    pub fn with_inclusive_prefixes<S: AsRef<str>>(mut self, prefixes: &[S]) -> Self {
        self.inclusive_prefixes = prefixes
            .iter()
            .map(|p| match p.as_ref() {
                "#default" => String::new(),
                other => other.to_owned(),
            })
            .collect();
        self
    }

    /// Namespace bindings in scope above the apex element.
    pub fn with_inherited_namespaces(mut self, inherited: Vec<(String, String)>) -> Self {
        self.inherited = inherited;
        self
    }

    /// Normalized inclusive prefixes ("" for the default namespace).
    pub fn inclusive_prefixes(&self) -> &[String] {
        &self.inclusive_prefixes
    }

    /// Check that the subtree is complete and return the output.
    pub fn finish(mut self) -> Result<W> {
        self.flush_pending()?;
        if let Some(open) = self.stack.last() {
            return Err(Error::XmlWrite(format!(
                "canonicalization ended inside <{}>",
                open.qname
            )));
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn rendered_binding(&self, prefix: &str) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .flat_map(|e| e.rendered.iter())
            .find(|d| d.prefix == prefix)
            .map(|d| d.uri.as_str())
    }

    fn declared_binding<'s>(&'s self, pending: &'s PendingElement, prefix: &str) -> Option<&'s str> {
        pending
            .declarations
            .iter()
            .chain(self.stack.iter().rev().flat_map(|e| e.declared.iter()))
            .chain(self.inherited.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    fn needs_rendering(&self, prefix: &str, uri: &str) -> bool {
        match self.rendered_binding(prefix) {
            Some(rendered) => rendered != uri,
            // An unrendered default namespace is the empty namespace.
            None => !(prefix.is_empty() && uri.is_empty()),
        }
    }

    fn flush_pending(&mut self) -> Result<()> {
        let Some(p) = self.pending.take() else {
            return Ok(());
        };

        let mut utilized: Vec<(String, String)> = Vec::new();
        let mut utilize = |prefix: &str, uri: &str| {
            if prefix != "xml" && !utilized.iter().any(|(up, _)| up == prefix) {
                utilized.push((prefix.to_owned(), uri.to_owned()));
            }
        };
        utilize(&p.prefix, &p.namespace_uri);
        for (prefix, _, uri, _) in &p.attributes {
            if !prefix.is_empty() {
                utilize(prefix, uri);
            }
        }
        for prefix in &self.inclusive_prefixes {
            if let Some(uri) = self.declared_binding(&p, prefix) {
                utilize(prefix, uri);
            }
        }

        let mut decls: Vec<NsDecl> = utilized
            .iter()
            .filter(|(prefix, uri)| self.needs_rendering(prefix, uri))
            .map(|(prefix, uri)| NsDecl::new(prefix, uri))
            .collect();
        decls.sort();

        let mut attrs: Vec<Attr> = p
            .attributes
            .iter()
            .map(|(prefix, local, uri, value)| Attr {
                ns_uri: uri.clone(),
                local_name: local.clone(),
                qualified_name: qualified_name(prefix, local),
                value: value.clone(),
            })
            .collect();
        attrs.sort();

        let qname = qualified_name(&p.prefix, &p.local_name);
        self.scratch.clear();
        self.scratch.push(b'<');
        self.scratch.extend_from_slice(qname.as_bytes());
        for d in &decls {
            d.render_into(&mut self.scratch);
        }
        for a in &attrs {
            a.render_into(&mut self.scratch);
        }
        self.scratch.push(b'>');
        self.out.write_all(&self.scratch)?;

        self.stack.push(OpenElement {
            qname,
            declared: p.declarations,
            rendered: decls,
        });
        Ok(())
    }

    fn write_escaped_text(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        if self.stack.is_empty() {
            return Ok(());
        }
        self.scratch.clear();
        escape::push_text(&mut self.scratch, text);
        self.out.write_all(&self.scratch)?;
        Ok(())
    }
}

impl<W: Write> XmlSink for CanonicalWriter<W> {
    fn write_start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<()> {
        self.flush_pending()?;
        self.pending = Some(PendingElement {
            prefix: prefix.to_owned(),
            local_name: local_name.to_owned(),
            namespace_uri: namespace_uri.to_owned(),
            declarations: Vec::new(),
            attributes: Vec::new(),
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
            pending.declarations.push((declared.to_owned(), value.to_owned()));
        } else {
            pending.attributes.push((
                prefix.to_owned(),
                local_name.to_owned(),
                namespace_uri.to_owned(),
                value.to_owned(),
            ));
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.write_escaped_text(text)
    }

    fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.write_escaped_text(text)
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        if self.with_comments && !self.stack.is_empty() {
            self.out.write_all(b"<!--")?;
            self.out.write_all(text.as_bytes())?;
            self.out.write_all(b"-->")?;
        }
        Ok(())
    }

    fn write_whitespace(&mut self, text: &str) -> Result<()> {
        self.write_escaped_text(text)
    }

    fn write_end_element(&mut self) -> Result<()> {
        self.flush_pending()?;
        let open = self
            .stack
            .pop()
            .ok_or_else(|| Error::XmlWrite("end element without open element".into()))?;
        self.out.write_all(b"</")?;
        self.out.write_all(open.qname.as_bytes())?;
        self.out.write_all(b">")?;
        Ok(())
    }
}
