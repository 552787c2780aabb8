#![forbid(unsafe_code)]

//! `<xenc:EncryptionMethod>`.

use wssec_core::{ns, Error, Result};
use wssec_crypto::keytransport::OaepParams;
use wssec_xml::{NodeKind, XmlReader, XmlSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionMethod {
    pub algorithm: String,
    /// `xenc:KeySize`, in bits.
    pub key_size: Option<u32>,
    /// `ds:DigestMethod`, used by RSA-OAEP.
    pub digest_method: Option<String>,
    /// `xenc:OAEPparams`.
    pub oaep_params: Option<Vec<u8>>,
}

impl EncryptionMethod {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            key_size: None,
            digest_method: None,
            oaep_params: None,
        }
    }

    /// The RSA-OAEP parameters carried by this element.
    pub fn oaep(&self) -> OaepParams {
        OaepParams {
            digest_uri: self.digest_method.clone(),
            label: self.oaep_params.clone(),
        }
    }

    pub fn read_from(reader: &mut dyn XmlReader) -> Result<Self> {
        if !reader.is_start_element(ns::node::ENCRYPTION_METHOD, ns::ENC)? {
            return Err(Error::MissingElement(ns::node::ENCRYPTION_METHOD.into()));
        }
        let mut method = Self::new(reader.get_attribute(ns::attr::ALGORITHM, "").ok_or_else(|| {
            Error::MissingAttribute(format!(
                "{} on {}",
                ns::attr::ALGORITHM,
                ns::node::ENCRYPTION_METHOD
            ))
        })?);
        if reader.is_empty_element() {
            reader.read()?;
            return Ok(method);
        }
        reader.read()?;

        while reader.move_to_content()? == NodeKind::Element {
            match (reader.namespace_uri(), reader.local_name()) {
                (ns::ENC, ns::node::KEY_SIZE) => {
                    let text = reader.read_element_string(ns::node::KEY_SIZE, ns::ENC)?;
                    let bits = text.trim().parse::<u32>().map_err(|_| {
                        Error::Protocol(format!("invalid <{}> '{}'", ns::node::KEY_SIZE, text.trim()))
                    })?;
                    method.key_size = Some(bits);
                }
                (ns::ENC, ns::node::OAEP_PARAMS) => {
                    method.oaep_params =
                        Some(reader.read_element_content_as_base64(ns::node::OAEP_PARAMS, ns::ENC)?);
                }
                (ns::DSIG, ns::node::DIGEST_METHOD) => {
                    method.digest_method =
                        reader.get_attribute(ns::attr::ALGORITHM, "").map(str::to_owned);
                    reader.skip()?;
                }
                _ => {
                    tracing::debug!(
                        element = reader.local_name(),
                        "skipping unknown EncryptionMethod parameter"
                    );
                    reader.skip()?;
                }
            }
        }
        reader.read_end_element()?;
        Ok(method)
    }

    pub fn write_to(&self, sink: &mut dyn XmlSink) -> Result<()> {
        sink.write_start_element(ns::prefix::ENC, ns::node::ENCRYPTION_METHOD, ns::ENC)?;
        sink.write_attribute("", ns::attr::ALGORITHM, "", &self.algorithm)?;
        if let Some(bits) = self.key_size {
            sink.write_element_string(ns::prefix::ENC, ns::node::KEY_SIZE, ns::ENC, &bits.to_string())?;
        }
        if let Some(params) = &self.oaep_params {
            sink.write_start_element(ns::prefix::ENC, ns::node::OAEP_PARAMS, ns::ENC)?;
            sink.write_base64(params)?;
            sink.write_end_element()?;
        }
        if let Some(digest) = &self.digest_method {
            sink.write_start_element(ns::prefix::DSIG, ns::node::DIGEST_METHOD, ns::DSIG)?;
            sink.write_attribute("", ns::attr::ALGORITHM, "", digest)?;
            sink.write_end_element()?;
        }
        sink.write_end_element()
    }
}
