#![forbid(unsafe_code)]

//! `<xenc:CipherData>`.

use wssec_core::{ns, Error, Result};
use wssec_xml::{XmlReader, XmlSink};

/// Inline cipher octets, optionally with the IV held apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherData {
    pub iv: Option<Vec<u8>>,
    pub cipher_text: Vec<u8>,
}

impl CipherData {
    pub fn new(cipher_value: Vec<u8>) -> Self {
        Self {
            iv: None,
            cipher_text: cipher_value,
        }
    }

    pub fn with_iv(iv: Vec<u8>, cipher_text: Vec<u8>) -> Self {
        Self {
            iv: Some(iv),
            cipher_text,
        }
    }

    pub fn len(&self) -> usize {
        self.iv.as_ref().map_or(0, Vec::len) + self.cipher_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `CipherValue` octets: `iv || cipher_text`.
    pub fn into_combined_cipher_value(self) -> Vec<u8> {
        match self.iv {
            None => self.cipher_text,
            Some(mut combined) => {
                combined.extend_from_slice(&self.cipher_text);
                combined
            }
        }
    }

    /// Like [`into_combined_cipher_value`](Self::into_combined_cipher_value)
    /// without consuming `self`.
    pub fn combined_cipher_value(&self) -> Vec<u8> {
        self.clone().into_combined_cipher_value()
    }

    pub fn read_from(reader: &mut dyn XmlReader) -> Result<Self> {
        reader.read_start_element(ns::node::CIPHER_DATA, ns::ENC)?;
        if reader.is_start_element(ns::node::CIPHER_REFERENCE, ns::ENC)? {
            return Err(Error::NotSupported(format!("<{}>", ns::node::CIPHER_REFERENCE)));
        }
        let value = reader.read_element_content_as_base64(ns::node::CIPHER_VALUE, ns::ENC)?;
        reader.read_end_element()?;
        Ok(Self::new(value))
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        sink.write_start_element(ns::prefix::ENC, ns::node::CIPHER_DATA, ns::ENC)?;
        sink.write_start_element(ns::prefix::ENC, ns::node::CIPHER_VALUE, ns::ENC)?;
        match &self.iv {
            None => sink.write_base64(&self.cipher_text)?,
            Some(_) => sink.write_base64(&self.combined_cipher_value())?,
        }
        sink.write_end_element()?;
        sink.write_end_element()
    }
}
