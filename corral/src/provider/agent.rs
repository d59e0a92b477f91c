//! Agent-deployed applications.
//!
//! The application is described by an application definition package and
//! installed on each node by an agent. This is the default provider.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{ClientProvider, LaunchArtifacts, LaunchContext, LocalResource, ResourceLimits};
use super::utils::{
    local_path, pair_artifacts, propagate_site_options, require_path_exists, validate_node_count,
};
use super::validation::{validate_components, validate_resource_requirements, PriorityRule};
use crate::conf::{keys, AggregateConf};
use crate::error::{CorralError, CorralResult};

/// Registry name of the agent provider.
pub const AGENT_PROVIDER: &str = "agent";

/// The generic worker role of agent applications.
pub const ROLE_NODE: &str = "node";

/// Name the application definition is shipped under.
pub const APP_DEFINITION_RESOURCE: &str = "app_definition";

/// Name the agent configuration is shipped under.
pub const AGENT_CONF_RESOURCE: &str = "agent.ini";

/// Name the application package is shipped under.
pub const PACKAGE_RESOURCE: &str = "app_package";

/// Token replaced with the instance name in site options.
pub const INSTANCE_NAME_TOKEN: &str = "${INSTANCE_NAME}";

/// Provider for agent-deployed applications.
#[derive(Debug, Clone)]
pub struct AgentProvider {
    limits: ResourceLimits,
}

impl AgentProvider {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }
}

impl ClientProvider for AgentProvider {
    fn name(&self) -> &str {
        AGENT_PROVIDER
    }

    fn prepare_instance_configuration(&self, definition: &mut AggregateConf) -> CorralResult<()> {
        definition
            .internal_mut()
            .put_if_unset(keys::INTERNAL_APPLICATION_TYPE, AGENT_PROVIDER);
        Ok(())
    }

    fn validate_instance_definition(&self, definition: &AggregateConf) -> CorralResult<()> {
        let resources = definition.resources()?;
        let app_conf = definition.app_conf()?;
        let internal = definition.internal()?;

        let nodes = resources.component_opt_int(ROLE_NODE, keys::COMPONENT_INSTANCES, 0)?;
        validate_node_count(ROLE_NODE, nodes, 0, -1)?;

        validate_components(resources, PriorityRule::Mandatory)?;
        validate_resource_requirements(resources, &self.limits)?;

        if app_conf.get(keys::AGENT_APP_DEF).is_none() {
            return Err(CorralError::bad_config(format!(
                "Application definition must be provided: missing option {}",
                keys::AGENT_APP_DEF
            )));
        }
        if app_conf.get(keys::AGENT_CONF).is_none() {
            return Err(CorralError::bad_config(format!(
                "Agent configuration must be provided: missing option {}",
                keys::AGENT_CONF
            )));
        }

        let package = app_conf.get(keys::AGENT_PACKAGE_PATH).unwrap_or("");
        let image = internal
            .get(keys::INTERNAL_APPLICATION_IMAGE_PATH)
            .unwrap_or("");
        if package.is_empty() && image.is_empty() {
            return Err(CorralError::bad_config(
                "Either agent package path or image root must be provided",
            ));
        }
        Ok(())
    }

    fn prepare_launch_artifacts(
        &self,
        definition: &AggregateConf,
        context: &LaunchContext,
        artifacts: &mut LaunchArtifacts,
    ) -> CorralResult<()> {
        let app_conf = definition.app_conf()?;

        let mut names = vec![APP_DEFINITION_RESOURCE, AGENT_CONF_RESOURCE];
        let mut sources = vec![
            PathBuf::from(app_conf.mandatory_option(keys::AGENT_APP_DEF)?),
            PathBuf::from(app_conf.mandatory_option(keys::AGENT_CONF)?),
        ];
        if let Some(package) = app_conf.get(keys::AGENT_PACKAGE_PATH).filter(|p| !p.is_empty()) {
            names.push(PACKAGE_RESOURCE);
            sources.push(PathBuf::from(package));
        }

        for (name, source) in pair_artifacts(&names, &sources)? {
            artifacts.resources.push(LocalResource { name, source });
        }

        let site = propagate_site_options(
            &app_conf.global,
            None,
            &[(INSTANCE_NAME_TOKEN, context.name.as_str())],
        );
        debug!(count = site.len(), "Agent site options propagated");
        artifacts.site_options.extend(site);
        Ok(())
    }

    fn preflight_validate_cluster_configuration(
        &self,
        definition: &AggregateConf,
        _generated_dir: &Path,
    ) -> CorralResult<()> {
        let app_conf = definition.app_conf()?;

        if let Some(path) = local_path(app_conf.mandatory_option(keys::AGENT_APP_DEF)?) {
            require_path_exists("Application definition", &path)?;
        }
        if let Some(path) = local_path(app_conf.mandatory_option(keys::AGENT_CONF)?) {
            require_path_exists("Agent configuration", &path)?;
        }

        let package = app_conf.get(keys::AGENT_PACKAGE_PATH).unwrap_or("");
        if package.is_empty() {
            let image = definition
                .internal()?
                .mandatory_option(keys::INTERNAL_APPLICATION_IMAGE_PATH)?;
            if let Some(path) = local_path(image) {
                require_path_exists("Application image", &path)?;
            }
        }
        Ok(())
    }
}
