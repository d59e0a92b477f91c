//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ClientSettings::default()`
//! implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

// =============================================================================
// [platform]
// =============================================================================

/// Default submission queue.
pub const DEFAULT_QUEUE: &str = "default";

/// Default submission priority.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Default maximum coordinator attempts.
pub const DEFAULT_RESTART_LIMIT: u32 = 2;

/// Default container memory ceiling (MB).
pub const DEFAULT_MAX_MEMORY: i64 = 8192;

/// Default container core ceiling.
pub const DEFAULT_MAX_CORES: i64 = 32;

// =============================================================================
// [store]
// =============================================================================

/// Default instance lock timeout (ms).
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// [launch]
// =============================================================================

/// Default wait for a submitted application to be accepted (s).
pub const DEFAULT_ACCEPT_TIMEOUT_SECS: u64 = 60;

/// Default first poll delay (ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default poll delay ceiling (ms).
pub const DEFAULT_POLL_MAX_INTERVAL_MS: u64 = 2000;

// =============================================================================
// [rpc]
// =============================================================================

/// Default RPC connect timeout (s).
pub const DEFAULT_RPC_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default RPC request timeout (s).
pub const DEFAULT_RPC_REQUEST_TIMEOUT_SECS: u64 = 15;

// =============================================================================
// [registry]
// =============================================================================

/// Default ZooKeeper port.
pub const DEFAULT_REGISTRY_PORT: u16 = crate::conf::keys::DEFAULT_ZOOKEEPER_PORT;

/// Default instance store directory (~/.corral/instances).
pub fn default_store_directory() -> PathBuf {
    config_directory().join("instances")
}

/// Default log file (~/.corral/logs/corral.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join("corral.log")
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            platform: PlatformSettings {
                url: None,
                user: None,
                queue: DEFAULT_QUEUE.to_string(),
                priority: DEFAULT_PRIORITY,
                restart_limit: DEFAULT_RESTART_LIMIT,
                max_memory: DEFAULT_MAX_MEMORY,
                max_cores: DEFAULT_MAX_CORES,
            },
            store: StoreSettings {
                directory: default_store_directory(),
                lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            },
            launch: LaunchSettings {
                accept_timeout_secs: DEFAULT_ACCEPT_TIMEOUT_SECS,
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
                poll_max_interval_ms: DEFAULT_POLL_MAX_INTERVAL_MS,
            },
            rpc: RpcSettings {
                connect_timeout_secs: DEFAULT_RPC_CONNECT_TIMEOUT_SECS,
                request_timeout_secs: DEFAULT_RPC_REQUEST_TIMEOUT_SECS,
            },
            registry: RegistrySettings {
                hosts: None,
                port: DEFAULT_REGISTRY_PORT,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
