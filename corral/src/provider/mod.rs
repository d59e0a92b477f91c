//! Application type providers.
//!
//! A provider knows how to default, validate and launch one kind of
//! application. Providers are plain trait objects registered by name; the
//! coordinator provider is applied to every instance ahead of the instance's
//! own provider.
//!
//! ```ignore
//! use corral::provider::{ProviderRegistry, ResourceLimits};
//!
//! let registry = ProviderRegistry::with_defaults(ResourceLimits::default());
//! for provider in registry.chain("agent")? {
//!     provider.validate_instance_definition(&definition)?;
//! }
//! ```

mod agent;
mod coordinator;
mod generic;
mod registry;
mod types;
mod utils;
mod validation;

pub use agent::{AgentProvider, AGENT_PROVIDER, ROLE_NODE};
pub use coordinator::{CoordinatorProvider, COORDINATOR_ENTRY_POINT, COORDINATOR_PROVIDER};
pub use generic::{GenericProvider, GENERIC_PROVIDER};
pub use registry::{ProviderRegistry, DEFAULT_PROVIDER};
pub use types::{ClientProvider, LaunchArtifacts, LaunchContext, LocalResource, ResourceLimits};
pub use utils::{
    build_env_map, build_path_to_home_dir, local_path, pair_artifacts, propagate_site_options,
    resource_requirement, validate_node_count,
};
pub use validation::{validate_components, validate_resource_requirements, PriorityRule};
