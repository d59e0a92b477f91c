//! Option key names used across the three configuration trees.
//!
//! Keys are plain strings so that hand-edited JSON documents and
//! command-line `key=value` overrides address the same namespace.

// =============================================================================
// Resource keys (resources tree)
// =============================================================================

/// Number of instances of a component.
pub const COMPONENT_INSTANCES: &str = "component.instances";

/// Scheduling priority of a component; positive and unique per instance.
pub const COMPONENT_PRIORITY: &str = "component.priority";

/// Memory requirement of one unit of a component, in MB.
pub const RESOURCE_MEMORY: &str = "resource.memory";

/// Core requirement of one unit of a component.
pub const RESOURCE_CORES: &str = "resource.cores";

/// Sentinel value meaning "use the platform maximum".
pub const RESOURCE_MAX: &str = "max";

/// Default memory for a component unit when none is given.
pub const DEFAULT_MEMORY: i64 = 256;

/// Default cores for a component unit when none is given.
pub const DEFAULT_CORES: i64 = 1;

// =============================================================================
// Coordinator component
// =============================================================================

/// Name of the coordinator's own management component.
pub const COMPONENT_COORDINATOR: &str = "coordinator";

/// Default memory of the coordinator in MB.
pub const DEFAULT_COORDINATOR_MEMORY: i64 = 1024;

/// Default cores of the coordinator.
pub const DEFAULT_COORDINATOR_CORES: i64 = 1;

/// Default heap of the coordinator.
pub const DEFAULT_COORDINATOR_HEAP: &str = "512M";

/// Heap size option for JVM-hosted components.
pub const JVM_HEAP: &str = "jvm.heapsize";

/// Extra JVM options.
pub const JVM_OPTS: &str = "jvm.opts";

/// Extra non-JVM arguments for a component.
pub const ROLE_ADDITIONAL_ARGS: &str = "role.additional.args";

/// Options with this prefix become environment variables.
pub const ENV_PREFIX: &str = "env.";

// =============================================================================
// Status report keys (cluster descriptions)
// =============================================================================

/// Status: the role name.
pub const ROLE_NAME: &str = "role.name";

/// Status: instances actually granted.
pub const ROLE_ACTUAL_INSTANCES: &str = "role.actual.instances";

/// Status: instances currently requested.
pub const ROLE_REQUESTED_INSTANCES: &str = "role.requested.instances";

/// Status: instances currently being released.
pub const ROLE_RELEASING_INSTANCES: &str = "role.releasing.instances";

/// Status: instances that failed.
pub const ROLE_FAILED_INSTANCES: &str = "role.failed.instances";

// =============================================================================
// Internal keys (internal tree)
// =============================================================================

/// Name of the provider that built the instance.
pub const INTERNAL_PROVIDER_NAME: &str = "internal.provider.name";

/// Application type recorded in status documents.
pub const INTERNAL_APPLICATION_TYPE: &str = "internal.application.type";

/// Path to an application image archive.
pub const INTERNAL_APPLICATION_IMAGE_PATH: &str = "internal.application.image.path";

/// Path to a pre-installed application home directory.
pub const INTERNAL_APPLICATION_HOME: &str = "internal.application.home";

/// Location of the generated configuration directory.
pub const INTERNAL_GENERATED_CONF_PATH: &str = "internal.generated.conf.path";

/// Location of the snapshot configuration directory.
pub const INTERNAL_SNAPSHOT_CONF_PATH: &str = "internal.snapshot.conf.path";

/// Location of the instance directory.
pub const INTERNAL_DATA_DIR_PATH: &str = "internal.data.dir.path";

/// Source file the definition was last loaded from.
pub const INTERNAL_CONF_FILENAME: &str = "internal.conf.filename";

/// Coordinator restart policy: seconds a container must live to not count as a failure.
pub const CONTAINER_FAILURE_SHORTLIFE: &str = "internal.container.failure.shortlife";

/// Default short-life threshold in seconds.
pub const DEFAULT_CONTAINER_FAILURE_SHORTLIFE: i64 = 60;

/// Number of container failures tolerated before the deployment fails.
pub const CONTAINER_FAILURE_THRESHOLD: &str = "internal.container.failure.threshold";

/// Default container failure threshold.
pub const DEFAULT_CONTAINER_FAILURE_THRESHOLD: i64 = 5;

/// Delay before containers are started, in milliseconds.
pub const CONTAINER_STARTUP_DELAY: &str = "internal.container.startup.delay";

/// Default container startup delay.
pub const DEFAULT_CONTAINER_STARTUP_DELAY: i64 = 5000;

/// Whether the coordinator monitors its components.
pub const COORDINATOR_MONITORING_ENABLED: &str = "internal.coordinator.monitoring.enabled";

// =============================================================================
// Registry keys (internal tree)
// =============================================================================

/// ZooKeeper quorum hosts.
pub const ZOOKEEPER_HOSTS: &str = "zookeeper.hosts";

/// ZooKeeper port.
pub const ZOOKEEPER_PORT: &str = "zookeeper.port";

/// ZooKeeper path for application data.
pub const ZOOKEEPER_PATH: &str = "zookeeper.path";

/// Registry path for service bindings.
pub const REGISTRY_PATH: &str = "internal.registry.path";

/// Default ZooKeeper port.
pub const DEFAULT_ZOOKEEPER_PORT: u16 = 2181;

// =============================================================================
// Application keys (appConfig tree)
// =============================================================================

/// Options with this prefix are written into generated site configuration.
pub const SITE_XML_PREFIX: &str = "site.";

/// Agent provider: application definition location.
pub const AGENT_APP_DEF: &str = "agent.app.def";

/// Agent provider: agent configuration location.
pub const AGENT_CONF: &str = "agent.conf";

/// Agent provider: application package path.
pub const AGENT_PACKAGE_PATH: &str = "agent.package.path";

// =============================================================================
// Propagation prefixes
// =============================================================================

/// appConfig global keys with these prefixes are copied into the internal tree.
pub const INTERNAL_PROPAGATION_PREFIXES: &[&str] = &["internal.", "corral.", "zookeeper."];

/// appConfig keys with these prefixes are copied into the resources tree.
pub const RESOURCE_PROPAGATION_PREFIXES: &[&str] = &["component.", "role.", "resource."];
