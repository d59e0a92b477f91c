//! Provider types and traits

use std::path::{Path, PathBuf};

use crate::conf::{AggregateConf, OptionMap};
use crate::error::{CorralError, CorralResult};

/// Largest container the platform will grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Memory ceiling in MB; substituted for `max`.
    pub max_memory: i64,
    /// Core ceiling; substituted for `max`.
    pub max_cores: i64,
}

impl ResourceLimits {
    /// Reject explicit requirements above the ceiling.
    pub fn check(&self, component: &str, memory: i64, cores: i64) -> CorralResult<()> {
        if self.max_memory > 0 && memory > self.max_memory {
            return Err(CorralError::bad_config(format!(
                "Component {} requests {} MB, above the platform maximum of {} MB",
                component, memory, self.max_memory
            )));
        }
        if self.max_cores > 0 && cores > self.max_cores {
            return Err(CorralError::bad_config(format!(
                "Component {} requests {} cores, above the platform maximum of {}",
                component, cores, self.max_cores
            )));
        }
        Ok(())
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_memory: 8192,
            max_cores: 32,
        }
    }
}

/// Paths an instance launch works with.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Instance name.
    pub name: String,
    /// Durable instance directory.
    pub instance_dir: PathBuf,
    /// Configuration snapshot taken at build time.
    pub snapshot_dir: PathBuf,
    /// Configuration generated for this launch.
    pub generated_dir: PathBuf,
    /// Pass debug flags to the coordinator.
    pub debug: bool,
}

/// A file shipped with the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalResource {
    /// Name the file is visible under at the far end.
    pub name: String,
    /// Local or cluster file system source.
    pub source: PathBuf,
}

/// Everything the providers contribute to a coordinator launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchArtifacts {
    /// Environment variables.
    pub env: OptionMap,
    /// Coordinator command line.
    pub command: Vec<String>,
    /// Files to ship.
    pub resources: Vec<LocalResource>,
    /// Site configuration written into the generated directory.
    pub site_options: OptionMap,
    /// Coordinator container memory in MB.
    pub memory: i64,
    /// Coordinator container cores.
    pub cores: i64,
}

/// Capabilities of an application type.
///
/// Providers are looked up by name in a
/// [`ProviderRegistry`](super::ProviderRegistry). The coordinator provider is
/// applied to every instance, followed by the provider the instance was built
/// with.
pub trait ClientProvider: Send + Sync {
    /// Registry name, recorded in the instance definition.
    fn name(&self) -> &str;

    /// Seed defaults into a fresh definition.
    ///
    /// Called before any user-supplied configuration is merged, so later
    /// sources override what is set here.
    fn prepare_instance_configuration(&self, definition: &mut AggregateConf) -> CorralResult<()>;

    /// Validate a definition before it is persisted or launched.
    fn validate_instance_definition(&self, definition: &AggregateConf) -> CorralResult<()>;

    /// Add launch artifacts for a resolved definition.
    fn prepare_launch_artifacts(
        &self,
        definition: &AggregateConf,
        context: &LaunchContext,
        artifacts: &mut LaunchArtifacts,
    ) -> CorralResult<()>;

    /// Final checks once the generated configuration directory is populated.
    fn preflight_validate_cluster_configuration(
        &self,
        definition: &AggregateConf,
        generated_dir: &Path,
    ) -> CorralResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_check() {
        let limits = ResourceLimits {
            max_memory: 1024,
            max_cores: 2,
        };
        assert!(limits.check("w", 1024, 2).is_ok());
        assert!(limits.check("w", 1025, 1).is_err());
        let err = limits.check("w", 512, 3).unwrap_err();
        assert!(err.to_string().contains("cores"));
    }

    #[test]
    fn test_unbounded_limits() {
        let limits = ResourceLimits {
            max_memory: 0,
            max_cores: 0,
        };
        assert!(limits.check("w", 1 << 20, 512).is_ok());
    }
}
