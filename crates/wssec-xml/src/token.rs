#![forbid(unsafe_code)]

//! One-pass token capture and replay.
//!
//! A [`TokenBuffer`] holds a flat list of [`Token`]s for exactly one
//! element subtree. It can be replayed any number of times into an
//! [`XmlSink`], optionally with one element (and everything below it)
//! suppressed, or read again through [`TokenBufferReader`].

use crate::element::SecurityElement;
use crate::reader::{NodeKind, XmlAttribute, XmlReader};
use crate::writer::XmlSink;
use wssec_core::{ns, Error, Result};

/// One recorded node.
///
/// `Attribute` tokens directly follow the `ElementStart` they belong to.
/// An `ElementStart` with `is_empty == false` is closed by an `ElementEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    ElementStart {
        prefix: String,
        local_name: String,
        namespace_uri: String,
        is_empty: bool,
    },
    Attribute {
        prefix: String,
        local_name: String,
        namespace_uri: String,
        value: String,
    },
    Text(String),
    CData(String),
    Comment(String),
    Whitespace(String),
    ElementEnd,
}

impl Token {
    fn is_attribute(&self) -> bool {
        matches!(self, Token::Attribute { .. })
    }
}

/// Describes the element suppressed on replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub local_name: String,
    pub namespace_uri: String,
    /// Depth relative to the recorded root (root is 0); `None` matches
    /// at any depth.
    pub depth: Option<usize>,
}

impl Exclusion {
    pub fn new(local_name: impl Into<String>, namespace_uri: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            namespace_uri: namespace_uri.into(),
            depth: None,
        }
    }

    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    fn matches(&self, local_name: &str, namespace_uri: &str, depth: usize) -> bool {
        self.local_name == local_name
            && self.namespace_uri == namespace_uri
            && self.depth.map_or(true, |d| d == depth)
    }
}

/// A recorded element subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    exclusion: Option<Exclusion>,
    inherited_namespaces: Vec<(String, String)>,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaces declared by ancestors of the recorded root.
    pub fn with_inherited_namespaces(inherited: Vec<(String, String)>) -> Self {
        Self {
            inherited_namespaces: inherited,
            ..Self::default()
        }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub(crate) fn pop(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn inherited_namespaces(&self) -> &[(String, String)] {
        &self.inherited_namespaces
    }

    pub fn exclusion(&self) -> Option<&Exclusion> {
        self.exclusion.as_ref()
    }

    pub fn set_exclusion(&mut self, exclusion: Exclusion) {
        self.exclusion = Some(exclusion);
    }

    pub fn clear_exclusion(&mut self) {
        self.exclusion = None;
    }

    /// Release spare capacity. Call once recording is finished and before
    /// the buffer is retained.
    pub fn trim(&mut self) {
        self.tokens.shrink_to_fit();
        self.inherited_namespaces.shrink_to_fit();
    }

    pub fn writer(&self) -> TokenStreamWriter<'_> {
        TokenStreamWriter {
            buffer: self,
            position: None,
        }
    }

    pub fn reader(&self) -> TokenBufferReader<'_> {
        TokenBufferReader::new(self)
    }

    fn root_attribute(&self, local_name: &str, namespace_uri: &str) -> Option<&str> {
        self.tokens
            .iter()
            .skip(1)
            .take_while(|t| t.is_attribute())
            .find_map(|t| match t {
                Token::Attribute {
                    local_name: l,
                    namespace_uri: n,
                    value,
                    ..
                } if l == local_name && n == namespace_uri => Some(value.as_str()),
                _ => None,
            })
    }
}

impl SecurityElement for TokenBuffer {
    fn id(&self) -> Option<&str> {
        self.root_attribute(ns::attr::ID, ns::WSU)
            .or_else(|| self.root_attribute(ns::attr::ID, ""))
    }

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        self.writer().write_to(sink)
    }

    fn lookup_inherited_namespace(&self, prefix: &str) -> Option<&str> {
        self.inherited_namespaces
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }
}

// ── Writer cursor ────────────────────────────────────────────────────

/// Forward-only cursor over a [`TokenBuffer`].
pub struct TokenStreamWriter<'a> {
    buffer: &'a TokenBuffer,
    position: Option<usize>,
}

impl<'a> TokenStreamWriter<'a> {
    pub fn move_to_first(&mut self) -> bool {
        self.position = Some(0);
        !self.buffer.tokens.is_empty()
    }

    /// Advance to the next node, skipping attributes of the current one.
    pub fn move_to_next(&mut self) -> bool {
        let tokens = &self.buffer.tokens;
        let mut next = self.position.map_or(0, |p| p + 1);
        while next < tokens.len() && tokens[next].is_attribute() {
            next += 1;
        }
        self.position = Some(next);
        next < tokens.len()
    }

    /// Step onto the next attribute of the current element, if any.
    pub fn move_to_next_attribute(&mut self) -> bool {
        let Some(p) = self.position else {
            return false;
        };
        match self.buffer.tokens.get(p + 1) {
            Some(t) if t.is_attribute() => {
                self.position = Some(p + 1);
                true
            }
            _ => false,
        }
    }

    pub fn token(&self) -> Option<&'a Token> {
        self.position.and_then(|p| self.buffer.tokens.get(p))
    }

    pub fn exclusion(&self) -> Option<&'a Exclusion> {
        self.buffer.exclusion.as_ref()
    }

    /// Replay the whole buffer into `sink`, honoring the exclusion.
    pub fn write_to(&mut self, sink: &mut dyn XmlSink) -> Result<()> {
        if !self.move_to_first() {
            return Ok(());
        }
        replay(&self.buffer.tokens, self.exclusion(), sink)?;
        self.position = Some(self.buffer.tokens.len());
        Ok(())
    }
}

/// Emit `tokens` into `sink`, suppressing the excluded element subtree.
pub(crate) fn replay(
    tokens: &[Token],
    exclusion: Option<&Exclusion>,
    sink: &mut dyn XmlSink,
) -> Result<()> {
    let mut depth = 0usize;
    // Depth of the excluded element while inside it.
    let mut skipping: Option<usize> = None;
    let mut attributes_suppressed = false;
    // An empty element is closed once its attributes have been written.
    let mut empty_close: Option<bool> = None;

    for token in tokens {
        if !token.is_attribute() {
            if let Some(suppressed) = empty_close.take() {
                if !suppressed {
                    sink.write_end_element()?;
                }
            }
        }
        match token {
            Token::ElementStart {
                prefix,
                local_name,
                namespace_uri,
                is_empty,
            } => {
                let excluded_here = skipping.is_none()
                    && exclusion.is_some_and(|e| e.matches(local_name, namespace_uri, depth));
                let suppressed = skipping.is_some() || excluded_here;
                if !suppressed {
                    sink.write_start_element(prefix, local_name, namespace_uri)?;
                }
                attributes_suppressed = suppressed;
                if *is_empty {
                    empty_close = Some(suppressed);
                } else {
                    if excluded_here {
                        skipping = Some(depth);
                    }
                    depth += 1;
                }
            }
            Token::Attribute {
                prefix,
                local_name,
                namespace_uri,
                value,
            } => {
                if !attributes_suppressed {
                    sink.write_attribute(prefix, local_name, namespace_uri, value)?;
                }
            }
            Token::ElementEnd => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::XmlWrite("unbalanced recorded end element".into()))?;
                if skipping.is_none() {
                    sink.write_end_element()?;
                } else if skipping == Some(depth) {
                    skipping = None;
                }
            }
            other => {
                if skipping.is_none() {
                    match other {
                        Token::Text(t) => sink.write_text(t)?,
                        Token::CData(t) => sink.write_cdata(t)?,
                        Token::Comment(t) => sink.write_comment(t)?,
                        Token::Whitespace(t) => sink.write_whitespace(t)?,
                        _ => {}
                    }
                }
            }
        }
    }
    if let Some(false) = empty_close {
        sink.write_end_element()?;
    }
    Ok(())
}

// ── Reader over a buffer ─────────────────────────────────────────────

/// Reads a [`TokenBuffer`] back as an [`XmlReader`].
///
/// The exclusion descriptor is a replay concern and is ignored here.
pub struct TokenBufferReader<'a> {
    buffer: &'a TokenBuffer,
    next: usize,
    current: Option<&'a Token>,
    kind: NodeKind,
    depth: usize,
    attributes: Vec<XmlAttribute>,
    open: Vec<&'a Token>,
    scopes: Vec<Vec<(String, String)>>,
    pop_scope: bool,
}

impl<'a> TokenBufferReader<'a> {
    pub fn new(buffer: &'a TokenBuffer) -> Self {
        Self {
            buffer,
            next: 0,
            current: None,
            kind: NodeKind::None,
            depth: 0,
            attributes: Vec::new(),
            open: Vec::new(),
            scopes: Vec::new(),
            pop_scope: false,
        }
    }

    /// Index one past the end of the subtree starting at `start`.
    fn subtree_end(&self, start: usize) -> Result<usize> {
        let tokens = &self.buffer.tokens;
        let mut depth = 0usize;
        for (i, t) in tokens.iter().enumerate().skip(start) {
            match t {
                Token::ElementStart { is_empty, .. } => {
                    if !is_empty {
                        depth += 1;
                    } else if depth == 0 {
                        let mut end = i + 1;
                        while end < tokens.len() && tokens[end].is_attribute() {
                            end += 1;
                        }
                        return Ok(end);
                    }
                }
                Token::ElementEnd => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| Error::XmlParse("unbalanced recorded end element".into()))?;
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                _ => {}
            }
        }
        Err(Error::XmlParse("recorded element is not closed".into()))
    }
}

impl<'a> XmlReader for TokenBufferReader<'a> {
    fn read(&mut self) -> Result<bool> {
        if self.pop_scope {
            self.scopes.pop();
            self.pop_scope = false;
        }
        self.attributes.clear();

        let buffer = self.buffer;
        let tokens = &buffer.tokens;
        let Some(token) = tokens.get(self.next) else {
            self.current = None;
            self.kind = NodeKind::None;
            self.depth = 0;
            return Ok(false);
        };
        self.next += 1;
        self.current = Some(token);
        match token {
            Token::ElementStart { is_empty, .. } => {
                let mut scope = Vec::new();
                while let Some(Token::Attribute {
                    prefix,
                    local_name,
                    namespace_uri,
                    value,
                }) = tokens.get(self.next)
                {
                    let attribute = XmlAttribute::new(
                        prefix.as_str(),
                        local_name.as_str(),
                        namespace_uri.as_str(),
                        value.as_str(),
                    );
                    if let Some(p) = attribute.declared_prefix() {
                        scope.push((p.to_owned(), value.clone()));
                    }
                    self.attributes.push(attribute);
                    self.next += 1;
                }
                self.scopes.push(scope);
                self.kind = NodeKind::Element;
                self.depth = self.open.len();
                if *is_empty {
                    self.pop_scope = true;
                } else {
                    self.open.push(token);
                }
            }
            Token::ElementEnd => {
                let start = self
                    .open
                    .pop()
                    .ok_or_else(|| Error::XmlParse("unbalanced recorded end element".into()))?;
                self.current = Some(start);
                self.kind = NodeKind::EndElement;
                self.depth = self.open.len();
                self.pop_scope = true;
            }
            Token::Text(_) => self.kind = NodeKind::Text,
            Token::CData(_) => self.kind = NodeKind::CData,
            Token::Comment(_) => self.kind = NodeKind::Comment,
            Token::Whitespace(_) => self.kind = NodeKind::Whitespace,
            Token::Attribute { .. } => {
                return Err(Error::XmlParse("attribute token outside a start element".into()))
            }
        }
        if !matches!(self.kind, NodeKind::Element | NodeKind::EndElement) {
            self.depth = self.open.len();
        }
        Ok(true)
    }

    fn node_kind(&self) -> NodeKind {
        self.kind
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn prefix(&self) -> &str {
        match self.current {
            Some(Token::ElementStart { prefix, .. }) => prefix,
            _ => "",
        }
    }

    fn local_name(&self) -> &str {
        match self.current {
            Some(Token::ElementStart { local_name, .. }) => local_name,
            _ => "",
        }
    }

    fn namespace_uri(&self) -> &str {
        match self.current {
            Some(Token::ElementStart { namespace_uri, .. }) => namespace_uri,
            _ => "",
        }
    }

    fn value(&self) -> &str {
        match self.current {
            Some(Token::Text(v) | Token::CData(v) | Token::Comment(v) | Token::Whitespace(v)) => v,
            _ => "",
        }
    }

    fn is_empty_element(&self) -> bool {
        self.kind == NodeKind::Element
            && matches!(self.current, Some(Token::ElementStart { is_empty: true, .. }))
    }

    fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => return Some(ns::XML),
            "xmlns" => return Some(ns::XMLNS),
            _ => {}
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|s| s.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
            .or_else(|| self.buffer.lookup_inherited_namespace(prefix))
    }

    fn in_scope_namespaces(&self) -> Vec<(String, String)> {
        let mut map: std::collections::BTreeMap<String, String> =
            self.buffer.inherited_namespaces.iter().cloned().collect();
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

    /// Replays the recorded tokens of the current subtree straight into
    /// `sink` instead of surfacing them one node at a time.
    fn write_canonical_subtree(&mut self, sink: &mut dyn XmlSink) -> Result<()> {
        if self.kind != NodeKind::Element {
            crate::reader::write_current_node(&*self, sink)?;
            self.read()?;
            return Ok(());
        }
        // `next` already points past the start tag and its attributes.
        let start = self.next - 1 - self.attributes.len();
        let end = self.subtree_end(start)?;
        replay(&self.buffer.tokens[start..end], None, sink)?;
        if !self.is_empty_element() {
            self.open.pop();
            self.pop_scope = true;
        }
        self.next = end;
        self.read()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::XmlTextWriter;

    fn start(local: &str, ns_uri: &str, is_empty: bool) -> Token {
        Token::ElementStart {
            prefix: String::new(),
            local_name: local.into(),
            namespace_uri: ns_uri.into(),
            is_empty,
        }
    }

    fn attr(local: &str, value: &str) -> Token {
        Token::Attribute {
            prefix: String::new(),
            local_name: local.into(),
            namespace_uri: String::new(),
            value: value.into(),
        }
    }

    fn envelope() -> TokenBuffer {
        let mut b = TokenBuffer::new();
        for t in [
            start("Envelope", "", false),
            attr("Id", "env"),
            start("Header", "", false),
            start("Signature", "urn:sig", false),
            start("SignedInfo", "urn:sig", true),
            attr("a", "1"),
            Token::Text("sig".into()),
            Token::ElementEnd,
            start("Signature", "urn:sig", true),
            Token::ElementEnd,
            start("Body", "", false),
            Token::Text("hi".into()),
            Token::ElementEnd,
            Token::ElementEnd,
        ] {
            b.push(t);
        }
        b
    }

    fn render(b: &TokenBuffer) -> String {
        let mut w = XmlTextWriter::new(Vec::new());
        b.writer().write_to(&mut w).unwrap();
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn replays_everything_without_exclusion() {
        let out = render(&envelope());
        assert_eq!(
            out,
            r#"<Envelope Id="env"><Header><Signature xmlns="urn:sig"><SignedInfo a="1"/>sig</Signature><Signature xmlns="urn:sig"/></Header><Body>hi</Body></Envelope>"#
        );
    }

    #[test]
    fn excludes_every_match_at_any_depth() {
        let mut b = envelope();
        b.set_exclusion(Exclusion::new("Signature", "urn:sig"));
        let out = render(&b);
        assert_eq!(out, r#"<Envelope Id="env"><Header/><Body>hi</Body></Envelope>"#);
    }

    #[test]
    fn exclusion_depth_must_match() {
        let mut b = envelope();
        b.set_exclusion(Exclusion::new("Signature", "urn:sig").at_depth(1));
        assert!(render(&b).contains("SignedInfo"));
        b.set_exclusion(Exclusion::new("Signature", "urn:sig").at_depth(2));
        assert!(!render(&b).contains("SignedInfo"));
    }

    #[test]
    fn excluded_empty_element_drops_its_attributes() {
        let mut b = envelope();
        b.set_exclusion(Exclusion::new("SignedInfo", "urn:sig"));
        let out = render(&b);
        assert!(out.contains(r#"<Signature xmlns="urn:sig">sig</Signature>"#));
        assert!(!out.contains(r#"a="1""#));
    }

    #[test]
    fn cursor_navigation() {
        let b = envelope();
        let mut w = b.writer();
        assert!(w.move_to_first());
        assert!(matches!(w.token(), Some(Token::ElementStart { local_name, .. }) if local_name == "Envelope"));
        assert!(w.move_to_next_attribute());
        assert!(matches!(w.token(), Some(Token::Attribute { value, .. }) if value == "env"));
        assert!(!w.move_to_next_attribute());
        assert!(w.move_to_next());
        assert!(matches!(w.token(), Some(Token::ElementStart { local_name, .. }) if local_name == "Header"));
    }

    #[test]
    fn id_prefers_wsu() {
        let mut b = TokenBuffer::new();
        b.push(start("Body", "", false));
        b.push(attr("Id", "plain"));
        b.push(Token::Attribute {
            prefix: "u".into(),
            local_name: "Id".into(),
            namespace_uri: ns::WSU.into(),
            value: "wsu".into(),
        });
        b.push(Token::ElementEnd);
        assert_eq!(b.id(), Some("wsu"));
    }

    #[test]
    fn reader_walks_buffer() {
        let b = envelope();
        let mut r = b.reader();
        r.read_start_element("Envelope", "").unwrap();
        assert!(r.is_start_element("Header", "").unwrap());
        r.skip().unwrap();
        assert_eq!(r.read_element_string("Body", "").unwrap(), "hi");
        r.read_end_element().unwrap();
        assert!(!r.read().unwrap());
    }

    #[test]
    fn reader_fast_path_replays_subtree() {
        let b = envelope();
        let mut r = b.reader();
        r.read_start_element("Envelope", "").unwrap();
        r.read_start_element("Header", "").unwrap();
        assert!(r.supports_canonicalization());
        let mut w = XmlTextWriter::new(Vec::new());
        r.write_canonical_subtree(&mut w).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, r#"<Signature xmlns="urn:sig"><SignedInfo a="1"/>sig</Signature>"#);
        assert!(r.is_start_element("Signature", "urn:sig").unwrap());
        assert!(r.is_empty_element());
    }

    #[test]
    fn stray_end_is_unbalanced_not_a_panic() {
        let mut buffer = TokenBuffer::new();
        buffer.push(Token::ElementEnd);
        buffer.push(start("a", "", true));
        let reader = buffer.reader();
        assert!(matches!(reader.subtree_end(0), Err(Error::XmlParse(ref m)) if m.contains("unbalanced")));
        assert_eq!(reader.subtree_end(1).unwrap(), 2);
    }

    #[test]
    fn trimmed_buffer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let mut b = envelope();
        b.trim();
        let shared = std::sync::Arc::new(b);
        assert_send_sync(&shared);
        let handle = {
            let shared = shared.clone();
            std::thread::spawn(move || render(&shared))
        };
        assert_eq!(handle.join().unwrap(), render(&shared));
    }
}
