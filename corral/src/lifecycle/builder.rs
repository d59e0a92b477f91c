//! Assembling a new instance definition.
//!
//! Sources are layered in a fixed order, later ones winning:
//!
//! 1. coordinator and application provider defaults
//! 2. the resources and application configuration files
//! 3. command-line options and component counts
//!
//! Afterwards the well-known prefixes are propagated between trees and the
//! instance bookkeeping (provider, image, paths, registry) is recorded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::conf::{keys, AggregateConf, ConfTree, OptionMap};
use crate::error::{CorralError, CorralResult};
use crate::provider::ClientProvider;

use super::naming::{default_registry_path, default_zookeeper_path};

/// Everything the caller supplies to build an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRequest {
    /// Application provider; the registry default when unset.
    pub provider: Option<String>,
    /// Resources tree file merged over provider defaults.
    pub resources_file: Option<PathBuf>,
    /// Application configuration tree file merged over provider defaults.
    pub app_conf_file: Option<PathBuf>,
    /// Local configuration directory copied into the snapshot.
    pub conf_dir: Option<PathBuf>,
    /// Archive containing the application.
    pub image: Option<String>,
    /// Directory where the application is pre-installed.
    pub app_home: Option<String>,
    /// Global application options.
    pub app_options: OptionMap,
    /// Per-component application options.
    pub component_options: BTreeMap<String, OptionMap>,
    /// Global resource options, applied to the application configuration.
    pub resource_options: OptionMap,
    /// Per-component resource options.
    pub resource_component_options: BTreeMap<String, OptionMap>,
    /// Requested instance count per component.
    pub component_counts: BTreeMap<String, String>,
    pub zookeeper_hosts: Option<String>,
    pub zookeeper_port: Option<u16>,
    pub zookeeper_path: Option<String>,
    /// Application package, recorded in the application configuration.
    pub package_path: Option<String>,
}

/// Instance-specific values recorded into the internal tree.
#[derive(Debug, Clone)]
pub(crate) struct InstancePaths {
    pub instance_dir: PathBuf,
    pub snapshot_dir: PathBuf,
    pub generated_dir: PathBuf,
    pub user: String,
}

/// Build an unvalidated definition from the provider chain and request.
pub(crate) fn assemble_definition(
    name: &str,
    chain: &[std::sync::Arc<dyn ClientProvider>],
    request: &BuildRequest,
    paths: &InstancePaths,
    registry_hosts: Option<&str>,
    registry_port: Option<u16>,
) -> CorralResult<AggregateConf> {
    if request.image.is_some() && request.app_home.is_some() {
        return Err(CorralError::bad_args(
            "Only one of an application image and an application home may be set",
        ));
    }

    let mut definition = AggregateConf::new(name);
    for provider in chain {
        provider.prepare_instance_configuration(&mut definition)?;
    }

    if let Some(path) = &request.resources_file {
        definition
            .resources_mut()
            .merge_file(path)
            .map_err(|e| file_error("--resources", path, e))?;
    }
    if let Some(path) = &request.app_conf_file {
        definition
            .app_conf_mut()
            .merge_file(path)
            .map_err(|e| file_error("--template", path, e))?;
    }

    let mut app_options = ConfTree::new();
    app_options.global = request.app_options.clone();
    definition.app_conf_mut().merge(&app_options);

    for (component, count) in &request.component_counts {
        debug!(component = component.as_str(), count = count.as_str(), "Component count");
        definition
            .resources_mut()
            .get_or_add_component(component)
            .insert(keys::COMPONENT_INSTANCES.to_string(), count.clone());
    }

    definition
        .app_conf_mut()
        .merge_components(&request.component_options);

    let app_conf = definition.app_conf()?.clone();
    for prefix in keys::INTERNAL_PROPAGATION_PREFIXES {
        definition.internal_mut().propagate_global_keys(&app_conf, prefix);
    }
    for prefix in keys::RESOURCE_PROPAGATION_PREFIXES {
        definition.resources_mut().propagate_global_keys(&app_conf, prefix);
        definition
            .resources_mut()
            .merge_components_prefix(&request.component_options, prefix, true);
    }

    let mut resource_options = ConfTree::new();
    resource_options.global = request.resource_options.clone();
    definition.app_conf_mut().merge(&resource_options);
    definition
        .resources_mut()
        .merge_components(&request.resource_component_options);

    record_instance_details(&mut definition, chain, request, paths, registry_hosts, registry_port)?;
    Ok(definition)
}

fn record_instance_details(
    definition: &mut AggregateConf,
    chain: &[std::sync::Arc<dyn ClientProvider>],
    request: &BuildRequest,
    paths: &InstancePaths,
    registry_hosts: Option<&str>,
    registry_port: Option<u16>,
) -> CorralResult<()> {
    let name = definition
        .name
        .clone()
        .ok_or_else(|| CorralError::Internal("definition has no instance name".into()))?;
    let provider = chain
        .last()
        .ok_or_else(|| CorralError::Internal("empty provider chain".into()))?;

    let internal = definition.internal_mut();
    internal.set(keys::INTERNAL_PROVIDER_NAME, provider.name());
    internal.set(
        keys::INTERNAL_GENERATED_CONF_PATH,
        paths.generated_dir.display().to_string(),
    );
    internal.set(
        keys::INTERNAL_SNAPSHOT_CONF_PATH,
        paths.snapshot_dir.display().to_string(),
    );
    internal.set(
        keys::INTERNAL_DATA_DIR_PATH,
        paths.instance_dir.join("database").display().to_string(),
    );
    if let Some(image) = &request.image {
        internal.set(keys::INTERNAL_APPLICATION_IMAGE_PATH, image.clone());
    }
    if let Some(home) = &request.app_home {
        internal.set(keys::INTERNAL_APPLICATION_HOME, home.clone());
    }
    internal.put_if_unset(
        keys::REGISTRY_PATH,
        default_registry_path(&paths.user, &name),
    );

    let zk_path = request
        .zookeeper_path
        .clone()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| default_zookeeper_path(&paths.user, &name));
    let zk_hosts = request
        .zookeeper_hosts
        .as_deref()
        .or(registry_hosts)
        .filter(|h| !h.is_empty());
    let zk_port = request
        .zookeeper_port
        .or(registry_port)
        .unwrap_or(keys::DEFAULT_ZOOKEEPER_PORT);

    let app_conf = definition.app_conf_mut();
    app_conf.set(keys::ZOOKEEPER_PATH, zk_path);
    app_conf.set(keys::ZOOKEEPER_PORT, zk_port.to_string());
    if let Some(hosts) = zk_hosts {
        app_conf.set(keys::ZOOKEEPER_HOSTS, hosts);
    }
    if let Some(package) = &request.package_path {
        app_conf.set(keys::AGENT_PACKAGE_PATH, package.clone());
    }
    Ok(())
}

fn file_error(arg: &str, path: &std::path::Path, e: CorralError) -> CorralError {
    CorralError::bad_config(format!(
        "incorrect argument to {}: \"{}\": {}",
        arg,
        path.display(),
        e
    ))
}
