#![forbid(unsafe_code)]

//! DSig context: algorithms and limits for signature processing.

use crate::pool::SignatureResourcePool;
use std::sync::Arc;
use wssec_crypto::AlgorithmRegistry;
use wssec_transforms::{StandardTransformFactory, TransformFactory};
use wssec_xml::ReaderQuotas;

/// Configuration shared by every signature operation of an endpoint.
///
/// Cheap to clone; nothing in it changes after construction.
#[derive(Clone)]
pub struct DsigContext {
    /// Accepted digest and keyed hash algorithms.
    pub registry: Arc<AlgorithmRegistry>,
    /// Maps `<ds:Transform>` URIs to transforms.
    pub transform_factory: Arc<dyn TransformFactory>,
    /// Limits for recording `<ds:SignedInfo>`.
    pub quotas: ReaderQuotas,
}

impl DsigContext {
    pub fn new(registry: AlgorithmRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            transform_factory: Arc::new(StandardTransformFactory),
            quotas: ReaderQuotas::default(),
        }
    }

    pub fn with_transform_factory(mut self, factory: Arc<dyn TransformFactory>) -> Self {
        self.transform_factory = factory;
        self
    }

    pub fn with_quotas(mut self, quotas: ReaderQuotas) -> Self {
        self.quotas = quotas;
        self
    }

    /// A fresh pool for one message. Pools are never shared.
    pub fn create_resource_pool(&self) -> SignatureResourcePool {
        SignatureResourcePool::new(self.registry.clone())
    }
}

impl Default for DsigContext {
    fn default() -> Self {
        Self::new(AlgorithmRegistry::standard())
    }
}

impl std::fmt::Debug for DsigContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsigContext")
            .field("registry", &self.registry)
            .field("quotas", &self.quotas)
            .finish_non_exhaustive()
    }
}
