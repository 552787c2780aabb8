#![forbid(unsafe_code)]

//! Transform chains for XML-DSig references.
//!
//! A `<ds:Reference>` names its transforms by URI. The factory maps each
//! URI to a [`Transform`]; the [`TransformChain`] keeps them in document
//! order and produces the digest input.

pub mod chain;
pub mod exc_c14n;
pub mod factory;
pub mod str_transform;
pub mod transform;

pub use chain::TransformChain;
pub use exc_c14n::ExclusiveC14nTransform;
pub use factory::{StandardTransformFactory, TransformFactory};
pub use str_transform::StrTransform;
pub use transform::{Transform, TransformInput};
