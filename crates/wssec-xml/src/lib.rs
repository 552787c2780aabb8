#![forbid(unsafe_code)]

//! XML plumbing for the wssec crates.
//!
//! The core never holds a DOM. Input arrives through a forward-only
//! [`XmlReader`]; a [`RecordingReader`] captures one subtree into a
//! [`TokenBuffer`] as a side effect of normal reading so that signature
//! processing can replay it later, as often as needed, into any
//! [`XmlSink`].

pub mod attributes;
pub mod element;
pub mod reader;
pub mod recording;
pub mod stream;
pub mod token;
pub mod writer;

pub use attributes::AttributeHolder;
pub use element::SecurityElement;
pub use reader::{NodeKind, XmlAttribute, XmlReader};
pub use recording::RecordingReader;
pub use stream::{ReaderQuotas, StreamReader};
pub use token::{Exclusion, Token, TokenBuffer, TokenBufferReader, TokenStreamWriter};
pub use writer::{XmlSink, XmlTextWriter};

/// Split a qualified name into `(prefix, local_name)`.
pub fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

/// Join a prefix and local name into a qualified name.
pub fn qualified_name(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_owned()
    } else {
        format!("{prefix}:{local_name}")
    }
}
