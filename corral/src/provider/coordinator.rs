//! The coordinator's own provider.
//!
//! Applied to every instance regardless of application type. It owns the
//! `coordinator` component: its resource defaults, restart policy and the
//! command line that starts it.

use std::path::Path;

use tracing::debug;

use super::types::{ClientProvider, LaunchArtifacts, LaunchContext, ResourceLimits};
use super::utils::{build_env_map, resource_requirement};
use crate::conf::{keys, AggregateConf, ConfTree, OptionMapExt};
use crate::error::CorralResult;

/// Registry name of the coordinator provider.
pub const COORDINATOR_PROVIDER: &str = "coordinator";

/// Entry point the coordinator is started with.
pub const COORDINATOR_ENTRY_POINT: &str = "corral-coordinator";

/// Provider for the coordinator component.
#[derive(Debug, Clone)]
pub struct CoordinatorProvider {
    limits: ResourceLimits,
}

impl CoordinatorProvider {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }

    fn defaults() -> (ConfTree, ConfTree) {
        let mut resources = ConfTree::new();
        let component = resources.get_or_add_component(keys::COMPONENT_COORDINATOR);
        component.insert(keys::COMPONENT_INSTANCES.into(), "1".into());
        component.insert(
            keys::RESOURCE_MEMORY.into(),
            keys::DEFAULT_COORDINATOR_MEMORY.to_string(),
        );
        component.insert(
            keys::RESOURCE_CORES.into(),
            keys::DEFAULT_COORDINATOR_CORES.to_string(),
        );

        let mut internal = ConfTree::new();
        internal.set(
            keys::CONTAINER_FAILURE_THRESHOLD,
            keys::DEFAULT_CONTAINER_FAILURE_THRESHOLD.to_string(),
        );
        internal.set(
            keys::CONTAINER_FAILURE_SHORTLIFE,
            keys::DEFAULT_CONTAINER_FAILURE_SHORTLIFE.to_string(),
        );
        internal.set(
            keys::CONTAINER_STARTUP_DELAY,
            keys::DEFAULT_CONTAINER_STARTUP_DELAY.to_string(),
        );
        internal.set(keys::COORDINATOR_MONITORING_ENABLED, "true");
        (resources, internal)
    }

    /// Memory and cores of the coordinator container.
    pub fn requirements(&self, definition: &AggregateConf) -> CorralResult<(i64, i64)> {
        let resources = definition.resources()?;
        let component = resources.component(keys::COMPONENT_COORDINATOR);
        let memory = resource_requirement(
            component.and_then(|c| c.option(keys::RESOURCE_MEMORY)),
            keys::DEFAULT_COORDINATOR_MEMORY,
            self.limits.max_memory,
        )?;
        let cores = resource_requirement(
            component.and_then(|c| c.option(keys::RESOURCE_CORES)),
            keys::DEFAULT_COORDINATOR_CORES,
            self.limits.max_cores,
        )?;
        Ok((memory, cores))
    }
}

impl ClientProvider for CoordinatorProvider {
    fn name(&self) -> &str {
        COORDINATOR_PROVIDER
    }

    fn prepare_instance_configuration(&self, definition: &mut AggregateConf) -> CorralResult<()> {
        let (resources, internal) = Self::defaults();
        definition.resources_mut().merge_without_overwrite(&resources);
        definition.internal_mut().merge_without_overwrite(&internal);
        Ok(())
    }

    fn validate_instance_definition(&self, definition: &AggregateConf) -> CorralResult<()> {
        let (memory, cores) = self.requirements(definition)?;
        self.limits
            .check(keys::COMPONENT_COORDINATOR, memory, cores)?;

        let internal = definition.internal()?;
        internal.option_int(
            keys::CONTAINER_FAILURE_THRESHOLD,
            keys::DEFAULT_CONTAINER_FAILURE_THRESHOLD,
        )?;
        internal.option_int(
            keys::CONTAINER_FAILURE_SHORTLIFE,
            keys::DEFAULT_CONTAINER_FAILURE_SHORTLIFE,
        )?;
        Ok(())
    }

    fn prepare_launch_artifacts(
        &self,
        definition: &AggregateConf,
        context: &LaunchContext,
        artifacts: &mut LaunchArtifacts,
    ) -> CorralResult<()> {
        let (memory, cores) = self.requirements(definition)?;
        artifacts.memory = memory;
        artifacts.cores = cores;

        let resources = definition.resources()?;
        if let Some(component) = resources.component(keys::COMPONENT_COORDINATOR) {
            artifacts.env.extend(build_env_map(component));
        }

        let app_conf = definition.app_conf()?;
        let heap = app_conf
            .component(keys::COMPONENT_COORDINATOR)
            .and_then(|c| c.option(keys::JVM_HEAP))
            .unwrap_or(keys::DEFAULT_COORDINATOR_HEAP);

        let command = &mut artifacts.command;
        command.push(COORDINATOR_ENTRY_POINT.to_string());
        command.push(format!("--heap={}", heap));
        command.push("create".to_string());
        command.push(context.name.clone());
        if context.debug {
            command.push("--debug".to_string());
        }
        command.push("--instance-dir".to_string());
        command.push(context.instance_dir.display().to_string());
        command.push("--generated-conf".to_string());
        command.push(context.generated_dir.display().to_string());

        debug!(memory, cores, command = ?artifacts.command, "Coordinator launch prepared");
        Ok(())
    }

    fn preflight_validate_cluster_configuration(
        &self,
        _definition: &AggregateConf,
        _generated_dir: &Path,
    ) -> CorralResult<()> {
        Ok(())
    }
}
