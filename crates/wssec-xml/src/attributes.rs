#![forbid(unsafe_code)]

//! Attribute capture with a size budget.

use crate::reader::{XmlAttribute, XmlReader};
use crate::writer::XmlSink;
use wssec_core::{Error, Result};

/// Attributes of one element, copied out of a reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeHolder {
    attributes: Vec<XmlAttribute>,
}

impl AttributeHolder {
    /// Copy the attributes of the current element, deducting their size
    /// from `remaining`. Running out of budget is fatal.
    pub fn read_attributes(reader: &dyn XmlReader, remaining: &mut usize) -> Result<Self> {
        let attributes = reader.attributes().to_vec();
        for attr in &attributes {
            charge(remaining, attr.size())?;
        }
        Ok(Self { attributes })
    }

    pub fn get(&self, local_name: &str, namespace_uri: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name && a.namespace_uri == namespace_uri)
            .map(|a| a.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &XmlAttribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        for a in &self.attributes {
            sink.write_attribute(&a.prefix, &a.local_name, &a.namespace_uri, &a.value)?;
        }
        Ok(())
    }

    pub fn into_vec(self) -> Vec<XmlAttribute> {
        self.attributes
    }
}

/// Deduct `size` bytes from a buffering budget.
pub fn charge(remaining: &mut usize, size: usize) -> Result<()> {
    *remaining = remaining.checked_sub(size).ok_or_else(|| {
        Error::QuotaExceeded("buffered XML exceeds the maximum buffer size".into())
    })?;
    Ok(())
}
