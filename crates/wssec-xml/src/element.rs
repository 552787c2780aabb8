#![forbid(unsafe_code)]

use crate::writer::XmlSink;
use wssec_core::Result;

/// Something that can be referenced by id and serialized again.
///
/// Implemented by recorded token buffers and by the XML-Encryption
/// element model.
pub trait SecurityElement {
    fn id(&self) -> Option<&str>;

    fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()>;

    /// Namespace bound to `prefix` by the ancestors of this element in the
    /// document it came from, if known.
    fn lookup_inherited_namespace(&self, _prefix: &str) -> Option<&str> {
        None
    }
}
