#![forbid(unsafe_code)]

/// Errors produced by the wssec crates.
///
/// Every variant is fatal for the operation that raised it. Nothing in the
/// core retries, and a digest mismatch is never downgraded to a warning.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("XML writing error: {0}")]
    XmlWrite(String),

    /// Malformed or unexpected XML shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Computed digest differs from the signed one.
    #[error("digest verification failed for reference: {0}")]
    DigestVerificationFailed(String),

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// A recognized configuration that is deliberately not implemented.
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Programming error: the object is not in a state that allows the call.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("invalid reference URI: {0}")]
    InvalidUri(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification the message layer uses to pick a fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Protocol,
    UnsupportedAlgorithm,
    DigestVerificationFailed,
    NotSupported,
    ArgumentInvalid,
    QuotaExceeded,
    Crypto,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::XmlParse(_)
            | Self::XmlWrite(_)
            | Self::Protocol(_)
            | Self::MissingElement(_)
            | Self::MissingAttribute(_)
            | Self::InvalidUri(_)
            | Self::Base64(_) => ErrorKind::Protocol,
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::DigestVerificationFailed(_) | Self::SignatureInvalid(_) => {
                ErrorKind::DigestVerificationFailed
            }
            Self::NotSupported(_) => ErrorKind::NotSupported,
            Self::InvalidArgument(_) | Self::InvalidOperation(_) => ErrorKind::ArgumentInvalid,
            Self::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Self::Crypto(_) | Self::Key(_) | Self::Certificate(_) => ErrorKind::Crypto,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::InvalidUri("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(
            Error::DigestVerificationFailed("#a".into()).kind(),
            ErrorKind::DigestVerificationFailed
        );
        assert_eq!(Error::NotSupported("chain".into()).kind(), ErrorKind::NotSupported);
        assert_eq!(
            Error::InvalidOperation("no input".into()).kind(),
            ErrorKind::ArgumentInvalid
        );
    }

    #[test]
    fn display_names_reference() {
        let e = Error::DigestVerificationFailed("#body".into());
        assert_eq!(e.to_string(), "digest verification failed for reference: #body");
    }
}
