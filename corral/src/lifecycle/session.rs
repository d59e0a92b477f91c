//! Per-invocation context shared by every lifecycle intent.
//!
//! A [`Session`] is built once per command from the client settings and
//! passed explicitly to the orchestrator. It owns the instance store, the
//! platform connection, the coordinator channel factory and the provider
//! registry. Nothing in it is mutated after construction.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientSettings;
use crate::error::{CorralError, CorralResult};
use crate::http::Timeouts;
use crate::platform::{HttpPlatform, Platform, PollPolicy};
use crate::provider::{ProviderRegistry, ResourceLimits};
use crate::rpc::{ChannelFactory, HttpChannelFactory};
use crate::store::InstanceStore;

/// Submission and monitoring parameters for launches.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchPolicy {
    pub queue: String,
    pub priority: i32,
    /// Maximum coordinator attempts.
    pub restart_limit: u32,
    /// Bounded wait for the platform to accept a submission.
    pub accept_timeout: Duration,
    pub poll: PollPolicy,
}

impl Default for LaunchPolicy {
    fn default() -> Self {
        Self {
            queue: "default".to_string(),
            priority: 1,
            restart_limit: 2,
            accept_timeout: Duration::from_secs(60),
            poll: PollPolicy::default(),
        }
    }
}

/// ZooKeeper quorum recorded into new instance definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryBinding {
    pub hosts: Option<String>,
    pub port: Option<u16>,
}

/// Everything an intent needs to act on instances.
pub struct Session {
    store: InstanceStore,
    platform: Arc<dyn Platform>,
    channels: Arc<dyn ChannelFactory>,
    providers: ProviderRegistry,
    launch: LaunchPolicy,
    registry: RegistryBinding,
}

impl Session {
    pub fn new(
        store: InstanceStore,
        platform: Arc<dyn Platform>,
        channels: Arc<dyn ChannelFactory>,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            store,
            platform,
            channels,
            providers,
            launch: LaunchPolicy::default(),
            registry: RegistryBinding::default(),
        }
    }

    pub fn with_launch_policy(mut self, launch: LaunchPolicy) -> Self {
        self.launch = launch;
        self
    }

    pub fn with_registry(mut self, registry: RegistryBinding) -> Self {
        self.registry = registry;
        self
    }

    /// Build a session talking to the resource manager named in `settings`.
    ///
    /// Fails with a command-argument error when no manager URL is configured.
    pub fn connect(settings: &ClientSettings) -> CorralResult<Self> {
        let url = settings.platform.url.as_deref().ok_or_else(|| {
            CorralError::bad_args(
                "No resource manager URL: set [platform] url in the config file or pass --manager",
            )
        })?;
        let user = settings
            .platform
            .user
            .clone()
            .or_else(login_user)
            .ok_or_else(|| CorralError::bad_config("Cannot determine the submitting user"))?;

        let timeouts = Timeouts {
            connect: Duration::from_secs(settings.rpc.connect_timeout_secs),
            request: Duration::from_secs(settings.rpc.request_timeout_secs),
        };
        debug!(url, user = %user, "Connecting to resource manager");

        let platform = HttpPlatform::connect(url, &user, timeouts)?;
        let channels = HttpChannelFactory::new(timeouts)?;
        let store = InstanceStore::new(&settings.store.directory)
            .with_lock_timeout(Duration::from_millis(settings.store.lock_timeout_ms));
        let providers = ProviderRegistry::with_defaults(ResourceLimits {
            max_memory: settings.platform.max_memory,
            max_cores: settings.platform.max_cores,
        });

        Ok(Self::new(store, Arc::new(platform), Arc::new(channels), providers)
            .with_launch_policy(LaunchPolicy::from(settings))
            .with_registry(RegistryBinding {
                hosts: settings.registry.hosts.clone(),
                port: Some(settings.registry.port),
            }))
    }

    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn channels(&self) -> &dyn ChannelFactory {
        self.channels.as_ref()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn launch_policy(&self) -> &LaunchPolicy {
        &self.launch
    }

    pub fn registry(&self) -> &RegistryBinding {
        &self.registry
    }
}

impl From<&ClientSettings> for LaunchPolicy {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            queue: settings.platform.queue.clone(),
            priority: settings.platform.priority,
            restart_limit: settings.platform.restart_limit,
            accept_timeout: Duration::from_secs(settings.launch.accept_timeout_secs),
            poll: PollPolicy {
                initial: Duration::from_millis(settings.launch.poll_interval_ms),
                max: Duration::from_millis(settings.launch.poll_max_interval_ms),
            },
        }
    }
}

fn login_user() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
}
