//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete client configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Resource manager connection and submission settings
    pub platform: PlatformSettings,
    /// Instance store settings
    pub store: StoreSettings,
    /// Launch monitoring settings
    pub launch: LaunchSettings,
    /// Coordinator RPC settings
    pub rpc: RpcSettings,
    /// Service registry (ZooKeeper) settings
    pub registry: RegistrySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Resource manager settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSettings {
    /// Base URL of the resource manager REST API
    pub url: Option<String>,
    /// User applications are submitted as; defaults to the login user
    pub user: Option<String>,
    /// Submission queue
    pub queue: String,
    /// Submission priority
    pub priority: i32,
    /// Maximum coordinator attempts
    pub restart_limit: u32,
    /// Largest container memory in MB, substituted for `max`
    pub max_memory: i64,
    /// Largest container core count, substituted for `max`
    pub max_cores: i64,
}

/// Instance store settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Root directory of instance definitions
    pub directory: PathBuf,
    /// Time to wait for an instance lock, in milliseconds
    pub lock_timeout_ms: u64,
}

/// Launch monitoring settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSettings {
    /// Time to wait for a submitted application to be accepted
    pub accept_timeout_secs: u64,
    /// First delay between state polls
    pub poll_interval_ms: u64,
    /// Ceiling on the delay between state polls
    pub poll_max_interval_ms: u64,
}

/// Coordinator RPC settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcSettings {
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Service registry settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    /// Comma-separated ZooKeeper quorum
    pub hosts: Option<String>,
    /// ZooKeeper port
    pub port: u16,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
