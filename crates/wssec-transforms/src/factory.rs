#![forbid(unsafe_code)]

use crate::exc_c14n::ExclusiveC14nTransform;
use crate::str_transform::StrTransform;
use crate::transform::Transform;
use wssec_c14n::C14nMode;
use wssec_core::{algorithm, Error, Result};

/// Creates transforms from their algorithm URIs.
pub trait TransformFactory: Send + Sync {
    fn create_transform(&self, uri: &str) -> Result<Box<dyn Transform>>;
}

/// Exclusive C14N, with and without comments, and STR-Transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTransformFactory;

impl TransformFactory for StandardTransformFactory {
    fn create_transform(&self, uri: &str) -> Result<Box<dyn Transform>> {
        match uri {
            algorithm::EXC_C14N => Ok(Box::new(ExclusiveC14nTransform::new(
                C14nMode::Exclusive,
                Vec::new(),
            ))),
            algorithm::EXC_C14N_WITH_COMMENTS => Ok(Box::new(ExclusiveC14nTransform::new(
                C14nMode::ExclusiveWithComments,
                Vec::new(),
            ))),
            algorithm::STR_TRANSFORM => Ok(Box::new(StrTransform::default())),
            _ => {
                tracing::debug!(uri, "no transform for algorithm");
                Err(Error::UnsupportedAlgorithm(format!("transform: {uri}")))
            }
        }
    }
}
