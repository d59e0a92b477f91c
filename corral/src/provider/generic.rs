//! Pre-installed or image-packaged applications without an agent.

use std::path::{Path, PathBuf};

use super::types::{ClientProvider, LaunchArtifacts, LaunchContext, LocalResource, ResourceLimits};
use super::utils::{build_path_to_home_dir, local_path, propagate_site_options, require_directory};
use super::validation::{validate_components, validate_resource_requirements, PriorityRule};
use crate::conf::{keys, AggregateConf};
use crate::error::{CorralError, CorralResult};

/// Registry name of the generic provider.
pub const GENERIC_PROVIDER: &str = "generic";

/// Launch script directory under the application home.
pub const BIN_DIR: &str = "bin";

/// Script each component is started with.
pub const LAUNCH_SCRIPT: &str = "launch";

/// Provider for applications that ship their own launch script.
#[derive(Debug, Clone)]
pub struct GenericProvider {
    limits: ResourceLimits,
}

impl GenericProvider {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }
}

impl ClientProvider for GenericProvider {
    fn name(&self) -> &str {
        GENERIC_PROVIDER
    }

    fn prepare_instance_configuration(&self, definition: &mut AggregateConf) -> CorralResult<()> {
        definition
            .internal_mut()
            .put_if_unset(keys::INTERNAL_APPLICATION_TYPE, GENERIC_PROVIDER);
        Ok(())
    }

    fn validate_instance_definition(&self, definition: &AggregateConf) -> CorralResult<()> {
        let resources = definition.resources()?;
        validate_components(resources, PriorityRule::Optional)?;
        validate_resource_requirements(resources, &self.limits)?;

        let internal = definition.internal()?;
        let image = internal.get(keys::INTERNAL_APPLICATION_IMAGE_PATH);
        let home = internal.get(keys::INTERNAL_APPLICATION_HOME);
        if image.is_none() && home.is_none() {
            return Err(CorralError::bad_config(format!(
                "Either {} or {} must be set",
                keys::INTERNAL_APPLICATION_IMAGE_PATH,
                keys::INTERNAL_APPLICATION_HOME
            )));
        }
        Ok(())
    }

    fn prepare_launch_artifacts(
        &self,
        definition: &AggregateConf,
        _context: &LaunchContext,
        artifacts: &mut LaunchArtifacts,
    ) -> CorralResult<()> {
        let internal = definition.internal()?;
        let image = internal.get(keys::INTERNAL_APPLICATION_IMAGE_PATH);
        let home = internal.get(keys::INTERNAL_APPLICATION_HOME);

        if let Some(image) = image {
            artifacts.resources.push(LocalResource {
                name: super::utils::IMAGE_INSTALL_SUBDIR.to_string(),
                source: PathBuf::from(image),
            });
        }
        let script = build_path_to_home_dir(image, home, BIN_DIR, LAUNCH_SCRIPT)?;
        artifacts
            .env
            .insert("CORRAL_LAUNCH_SCRIPT".to_string(), script);

        artifacts
            .site_options
            .extend(propagate_site_options(&definition.app_conf()?.global, None, &[]));
        Ok(())
    }

    fn preflight_validate_cluster_configuration(
        &self,
        definition: &AggregateConf,
        _generated_dir: &Path,
    ) -> CorralResult<()> {
        let internal = definition.internal()?;
        if internal.get(keys::INTERNAL_APPLICATION_IMAGE_PATH).is_some() {
            return Ok(());
        }
        let home = internal.mandatory_option(keys::INTERNAL_APPLICATION_HOME)?;
        if let Some(home) = local_path(home) {
            require_directory("Application home", &home)?;
            require_directory("Application bin directory", &home.join(BIN_DIR))?;
        }
        Ok(())
    }
}
