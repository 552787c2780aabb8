#![forbid(unsafe_code)]

//! A reader that records what it reads.
//!
//! [`RecordingReader`] forwards every call to the reader it wraps and, while
//! the subtree it was attached to is still open, appends each visited node
//! to a [`TokenBuffer`]. One physical pass serves the caller that parses the
//! element and every later canonicalization or re-serialization of it.

use crate::attributes::{charge, AttributeHolder};
use crate::reader::{decode_base64, decode_bin_hex, NodeKind, XmlAttribute, XmlReader};
use crate::stream::ReaderQuotas;
use crate::token::{Token, TokenBuffer};
use crate::SecurityElement;
use wssec_core::{Error, Result};

pub struct RecordingReader<R: XmlReader> {
    inner: R,
    buffer: TokenBuffer,
    start_depth: usize,
    record_done: bool,
    remaining: usize,
}

impl<R: XmlReader> RecordingReader<R> {
    /// Start recording at the element `inner` is positioned on.
    pub fn attach(inner: R) -> Result<Self> {
        Self::attach_with_quotas(inner, &ReaderQuotas::default())
    }

    pub fn attach_with_quotas(inner: R, quotas: &ReaderQuotas) -> Result<Self> {
        if inner.node_kind() != NodeKind::Element {
            return Err(Error::Protocol(format!(
                "recording must start on an element, reader is on {:?}",
                inner.node_kind()
            )));
        }
        let mut this = Self {
            buffer: TokenBuffer::with_inherited_namespaces(inner.in_scope_namespaces()),
            start_depth: inner.depth(),
            record_done: false,
            remaining: quotas.max_buffer_size,
            inner,
        };
        this.record_current()?;
        Ok(this)
    }

    pub fn buffer(&self) -> &TokenBuffer {
        &self.buffer
    }

    /// Finish and take the recorded buffer, trimmed.
    pub fn into_buffer(self) -> Result<TokenBuffer> {
        if !self.record_done {
            return Err(Error::InvalidOperation(
                "recorded element has not been read to its end".into(),
            ));
        }
        let mut buffer = self.buffer;
        buffer.trim();
        tracing::trace!(id = buffer.id().unwrap_or_default(), "recorded element");
        Ok(buffer)
    }

    pub fn is_record_done(&self) -> bool {
        self.record_done
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn record_text(&mut self, token: Token, len: usize) -> Result<()> {
        charge(&mut self.remaining, len)?;
        self.buffer.push(token);
        Ok(())
    }

    fn record_current(&mut self) -> Result<()> {
        if self.record_done {
            return Ok(());
        }
        let kind = self.inner.node_kind();
        match kind {
            NodeKind::Element => {
                charge(
                    &mut self.remaining,
                    self.inner.prefix().len()
                        + self.inner.local_name().len()
                        + self.inner.namespace_uri().len(),
                )?;
                let attributes = AttributeHolder::read_attributes(&self.inner, &mut self.remaining)?;
                let is_empty = self.inner.is_empty_element();
                self.buffer.push(Token::ElementStart {
                    prefix: self.inner.prefix().to_owned(),
                    local_name: self.inner.local_name().to_owned(),
                    namespace_uri: self.inner.namespace_uri().to_owned(),
                    is_empty,
                });
                for a in attributes.into_vec() {
                    let XmlAttribute {
                        prefix,
                        local_name,
                        namespace_uri,
                        value,
                    } = a;
                    self.buffer.push(Token::Attribute {
                        prefix,
                        local_name,
                        namespace_uri,
                        value,
                    });
                }
                if is_empty && self.inner.depth() == self.start_depth {
                    self.record_done = true;
                }
            }
            NodeKind::EndElement => {
                self.buffer.push(Token::ElementEnd);
                if self.inner.depth() == self.start_depth {
                    self.record_done = true;
                }
            }
            NodeKind::Text | NodeKind::CData | NodeKind::Comment | NodeKind::Whitespace => {
                let value = self.inner.value().to_owned();
                let len = value.len();
                let token = match kind {
                    NodeKind::Text => Token::Text(value),
                    NodeKind::CData => Token::CData(value),
                    NodeKind::Comment => Token::Comment(value),
                    _ => Token::Whitespace(value),
                };
                self.record_text(token, len)?;
            }
            NodeKind::None => {}
        }
        Ok(())
    }

    /// Read all adjacent text as one value. Each run of text between
    /// comments is recorded as one token; comments are kept in place.
    fn read_joined_content(&mut self) -> Result<String> {
        if self.record_done {
            return self.inner.read_content_as_string();
        }
        // The current node was recorded when it was reached; it is
        // recorded again below as part of its run.
        let kind = self.inner.node_kind();
        if kind.is_content() || kind == NodeKind::Comment {
            let refund = match self.buffer.tokens().last() {
                Some(Token::Text(t) | Token::CData(t) | Token::Whitespace(t) | Token::Comment(t)) => {
                    Some(t.len())
                }
                _ => None,
            };
            if let Some(len) = refund {
                self.buffer.pop();
                self.remaining += len;
            }
        }
        let mut text = String::new();
        let mut run = String::new();
        let mut advanced = false;
        loop {
            match self.inner.node_kind() {
                NodeKind::Text | NodeKind::CData | NodeKind::Whitespace => {
                    text.push_str(self.inner.value());
                    run.push_str(self.inner.value());
                }
                NodeKind::Comment => {
                    self.record_run(&mut run)?;
                    let comment = self.inner.value().to_owned();
                    let len = comment.len();
                    self.record_text(Token::Comment(comment), len)?;
                }
                _ => break,
            }
            if !self.inner.read()? {
                return Err(Error::Protocol(
                    "end of input inside recorded element content".into(),
                ));
            }
            advanced = true;
        }
        self.record_run(&mut run)?;
        // Without advancing, the node after the content is already recorded.
        if advanced {
            self.record_current()?;
        }
        Ok(text)
    }

    fn record_run(&mut self, run: &mut String) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(run);
        let len = text.len();
        self.record_text(Token::Text(text), len)
    }
}

impl<R: XmlReader> XmlReader for RecordingReader<R> {
    fn read(&mut self) -> Result<bool> {
        let more = self.inner.read()?;
        if !self.record_done {
            if !more {
                return Err(Error::Protocol(
                    "end of input before the recorded element was closed".into(),
                ));
            }
            self.record_current()?;
        }
        Ok(more)
    }

    fn node_kind(&self) -> NodeKind {
        self.inner.node_kind()
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }

    fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    fn local_name(&self) -> &str {
        self.inner.local_name()
    }

    fn namespace_uri(&self) -> &str {
        self.inner.namespace_uri()
    }

    fn value(&self) -> &str {
        self.inner.value()
    }

    fn is_empty_element(&self) -> bool {
        self.inner.is_empty_element()
    }

    fn attributes(&self) -> &[XmlAttribute] {
        self.inner.attributes()
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.inner.lookup_namespace(prefix)
    }

    fn in_scope_namespaces(&self) -> Vec<(String, String)> {
        self.inner.in_scope_namespaces()
    }

    fn read_content_as_base64(&mut self) -> Result<Vec<u8>> {
        let text = self.read_joined_content()?;
        decode_base64(&text)
    }

    fn read_content_as_bin_hex(&mut self) -> Result<Vec<u8>> {
        let text = self.read_joined_content()?;
        decode_bin_hex(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::write_current_subtree;
    use crate::stream::StreamReader;
    use crate::writer::XmlTextWriter;
    use crate::SecurityElement;
    use proptest::prelude::*;

    fn positioned(xml: &str) -> StreamReader<&[u8]> {
        let mut r = StreamReader::from_str(xml);
        r.move_to_content().unwrap();
        r
    }

    fn replayed(buffer: &TokenBuffer) -> String {
        let mut w = XmlTextWriter::new(Vec::new());
        buffer.write_to(&mut w).unwrap();
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    fn copied(xml: &str) -> String {
        let mut r = positioned(xml);
        let mut w = XmlTextWriter::new(Vec::new());
        write_current_subtree(&mut r, &mut w).unwrap();
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn attach_requires_element() {
        let mut r = StreamReader::from_str("<a>text</a>");
        r.read().unwrap();
        r.read().unwrap();
        let err = RecordingReader::attach(&mut r).err().unwrap();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn records_while_caller_parses() {
        let xml = r#"<e:EncryptedKey xmlns:e="urn:e" Id="k"><e:CipherData><e:CipherValue>AAEC</e:CipherValue></e:CipherData></e:EncryptedKey>"#;
        let mut inner = positioned(xml);
        let mut r = RecordingReader::attach(&mut inner).unwrap();
        r.read_start_element("EncryptedKey", "urn:e").unwrap();
        r.read_start_element("CipherData", "urn:e").unwrap();
        let bytes = r.read_element_content_as_base64("CipherValue", "urn:e").unwrap();
        assert_eq!(bytes, vec![0, 1, 2]);
        assert!(!r.is_record_done());
        r.read_end_element().unwrap();
        assert!(r.is_record_done());
        r.read_end_element().unwrap();
        let buffer = r.into_buffer().unwrap();
        assert_eq!(buffer.id(), Some("k"));
        assert_eq!(replayed(&buffer), copied(xml));
    }

    #[test]
    fn binary_content_becomes_one_text_token() {
        let xml = "<v>AAEC<!-- split -->AwQF</v>";
        let mut inner = positioned(xml);
        let mut r = RecordingReader::attach(&mut inner).unwrap();
        let bytes = r.read_element_content_as_base64("v", "").unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 3, 4, 5]);
        let buffer = r.into_buffer().unwrap();
        assert_eq!(
            buffer.tokens()[1..],
            [
                Token::Text("AAEC".into()),
                Token::Comment(" split ".into()),
                Token::Text("AwQF".into()),
                Token::ElementEnd,
            ]
        );
        assert_eq!(replayed(&buffer), copied(xml));
    }

    #[test]
    fn leading_comment_in_binary_content_is_kept_once() {
        let xml = "<v><!--x--> AQ\n==</v>";
        let mut inner = positioned(xml);
        let mut r = RecordingReader::attach(&mut inner).unwrap();
        assert_eq!(r.read_element_content_as_base64("v", "").unwrap(), vec![1]);
        let buffer = r.into_buffer().unwrap();
        assert_eq!(buffer.len(), 4);
        assert_eq!(replayed(&buffer), copied(xml));
    }

    #[test]
    fn empty_binary_content_keeps_nesting() {
        let xml = "<a><v></v></a>";
        let mut inner = positioned(xml);
        let mut r = RecordingReader::attach(&mut inner).unwrap();
        r.read_start_element("a", "").unwrap();
        assert!(r.read_element_content_as_base64("v", "").unwrap().is_empty());
        r.read_end_element().unwrap();
        assert!(r.is_record_done());
        let buffer = r.into_buffer().unwrap();
        let ends = buffer.tokens().iter().filter(|t| matches!(t, Token::ElementEnd)).count();
        assert_eq!(ends, 2);
        assert_eq!(replayed(&buffer), copied(xml));
    }

    #[test]
    fn stops_recording_after_end() {
        let mut inner = StreamReader::from_str("<r><a>1</a><b/></r>");
        inner.read().unwrap();
        inner.read().unwrap();
        let mut r = RecordingReader::attach(&mut inner).unwrap();
        r.skip().unwrap();
        assert!(r.is_record_done());
        assert_eq!(r.local_name(), "b");
        r.skip().unwrap();
        let buffer = r.into_buffer().unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(replayed(&buffer), "<a>1</a>");
    }

    #[test]
    fn inherited_namespaces_are_captured() {
        let mut inner = StreamReader::from_str(r#"<s:E xmlns:s="urn:s" xmlns:x="urn:x"><s:B/></s:E>"#);
        inner.read().unwrap();
        inner.read().unwrap();
        let r = RecordingReader::attach(&mut inner).unwrap();
        let buffer = r.into_buffer().unwrap();
        assert_eq!(buffer.lookup_inherited_namespace("x"), Some("urn:x"));
    }

    #[test]
    fn buffer_quota_is_fatal() {
        let quotas = ReaderQuotas {
            max_buffer_size: 16,
            ..Default::default()
        };
        let mut inner = positioned("<a>0123456789abcdefghij</a>");
        let mut r = RecordingReader::attach_with_quotas(&mut inner, &quotas).unwrap();
        assert!(matches!(r.read(), Err(Error::QuotaExceeded(_))));
    }

    #[test]
    fn truncated_input_is_protocol_error() {
        let mut inner = positioned("<a><b/>");
        let mut r = RecordingReader::attach(&mut inner).unwrap();
        r.read().unwrap();
        assert!(r.read().is_err());
    }

    // ── Replay fidelity ──────────────────────────────────────────────

    #[derive(Debug, Clone)]
    enum Node {
        Element(String, Vec<(String, String)>, Vec<Node>),
        Text(String),
    }

    fn escape(s: &str) -> String {
        s.replace('&', "&amp;").replace('<', "&lt;").replace('"', "&quot;")
    }

    fn serialize(node: &Node, out: &mut String) {
        match node {
            Node::Text(t) => out.push_str(&escape(t)),
            Node::Element(name, attrs, children) => {
                out.push('<');
                out.push_str(name);
                for (k, v) in attrs {
                    out.push_str(&format!(" {k}=\"{}\"", escape(v)));
                }
                if children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for c in children {
                        serialize(c, out);
                    }
                    out.push_str(&format!("</{name}>"));
                }
            }
        }
    }

    fn arb_element() -> impl Strategy<Value = Node> {
        let leaf = "[a-z <>&]{1,8}".prop_map(Node::Text);
        let node = leaf.prop_recursive(4, 32, 4, |inner| {
            (
                "[a-z]{1,6}",
                prop::collection::btree_map("[a-z]{1,4}", "[a-z0-9&<\"]{0,6}", 0..3),
                prop::collection::vec(inner, 0..4),
            )
                .prop_map(|(n, a, c)| Node::Element(n, a.into_iter().collect(), c))
        });
        (
            "[a-z]{1,6}",
            prop::collection::btree_map("[a-z]{1,4}", "[a-z0-9]{0,6}", 0..3),
            prop::collection::vec(node, 0..4),
        )
            .prop_map(|(n, a, c)| Node::Element(n, a.into_iter().collect(), c))
    }

    proptest! {
        #[test]
        fn replay_matches_direct_copy(root in arb_element()) {
            let mut xml = String::new();
            serialize(&root, &mut xml);

            let mut inner = positioned(&xml);
            let mut r = RecordingReader::attach(&mut inner).unwrap();
            r.skip().unwrap();
            let buffer = r.into_buffer().unwrap();

            prop_assert_eq!(replayed(&buffer), copied(&xml));
        }
    }
}
