//! Name-keyed provider lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::agent::{AgentProvider, AGENT_PROVIDER};
use super::coordinator::CoordinatorProvider;
use super::generic::GenericProvider;
use super::types::{ClientProvider, ResourceLimits};
use crate::error::{CorralError, CorralResult};

/// Provider used when none is named.
pub const DEFAULT_PROVIDER: &str = AGENT_PROVIDER;

/// Registry of client providers.
///
/// The coordinator provider is held separately: it is applied to every
/// instance and cannot be selected as an application type.
///
/// # Example
///
/// ```
/// use corral::provider::{ProviderRegistry, ResourceLimits};
///
/// let registry = ProviderRegistry::with_defaults(ResourceLimits::default());
/// assert!(registry.get("agent").is_ok());
/// assert!(registry.get("generic").is_ok());
/// assert!(registry.get("hbase").is_err());
/// ```
pub struct ProviderRegistry {
    coordinator: Arc<dyn ClientProvider>,
    providers: BTreeMap<String, Arc<dyn ClientProvider>>,
}

impl ProviderRegistry {
    /// Create a registry with only the coordinator provider.
    pub fn new(coordinator: Arc<dyn ClientProvider>) -> Self {
        Self {
            coordinator,
            providers: BTreeMap::new(),
        }
    }

    /// Create a registry with the shipped providers.
    pub fn with_defaults(limits: ResourceLimits) -> Self {
        let mut registry = Self::new(Arc::new(CoordinatorProvider::new(limits)));
        registry.register(Arc::new(AgentProvider::new(limits)));
        registry.register(Arc::new(GenericProvider::new(limits)));
        registry
    }

    /// Add or replace a provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn ClientProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> CorralResult<Arc<dyn ClientProvider>> {
        self.providers.get(name).cloned().ok_or_else(|| {
            CorralError::bad_args(format!(
                "Unknown provider \"{}\"; known providers: {}",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// The provider applied to every instance.
    pub fn coordinator(&self) -> Arc<dyn ClientProvider> {
        Arc::clone(&self.coordinator)
    }

    /// The coordinator provider followed by the named provider.
    pub fn chain(&self, name: &str) -> CorralResult<[Arc<dyn ClientProvider>; 2]> {
        Ok([self.coordinator(), self.get(name)?])
    }

    /// Names of the selectable providers.
    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("coordinator", &self.coordinator.name())
            .field("providers", &self.names())
            .finish()
    }
}
