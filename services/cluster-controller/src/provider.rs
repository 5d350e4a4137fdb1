//! Cloud provider registry.
//!
//! Each platform registers one [`CloudProvider`]. The deletion sequence looks
//! the provider up by the platform named in the cluster's cloud spec, so new
//! platforms plug in without touching the sequence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::model::{CloudSpec, PlatformKind};

/// Releases the infrastructure a cluster provisioned on its platform.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Must be safe to call again after a partial or completed cleanup.
    async fn clean_up(&self, spec: &CloudSpec) -> anyhow::Result<()>;
}

/// Errors resolving a provider for a cloud spec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("cloud spec of datacenter {datacenter} names no platform")]
    NoPlatform { datacenter: String },

    #[error("no cloud provider registered for platform {0}")]
    Unsupported(PlatformKind),
}

/// Provider for platforms without infrastructure of their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvider;

#[async_trait]
impl CloudProvider for NoopProvider {
    async fn clean_up(&self, spec: &CloudSpec) -> anyhow::Result<()> {
        debug!(datacenter = %spec.datacenter_name, "Nothing to clean up");
        Ok(())
    }
}

/// Maps platform identities to providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<PlatformKind, Arc<dyn CloudProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the providers that need no external configuration.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PlatformKind::BringYourOwn, Arc::new(NoopProvider));
        registry.register(PlatformKind::Fake, Arc::new(NoopProvider));
        registry
    }

    /// Register `provider` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: PlatformKind, provider: Arc<dyn CloudProvider>) {
        self.providers.insert(kind, provider);
    }

    pub fn resolve(&self, spec: &CloudSpec) -> Result<Arc<dyn CloudProvider>, ProviderError> {
        let kind = spec
            .platform
            .as_ref()
            .map(|platform| platform.kind())
            .ok_or_else(|| ProviderError::NoPlatform {
                datacenter: spec.datacenter_name.to_string(),
            })?;

        self.providers
            .get(&kind)
            .cloned()
            .ok_or(ProviderError::Unsupported(kind))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("platforms", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
