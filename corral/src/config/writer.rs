//! INI serialization logic for converting `ClientSettings` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ClientSettings;

/// Convert settings to a commented INI string for saving.
pub(super) fn to_config_string(settings: &ClientSettings) -> String {
    let url = settings.platform.url.as_deref().unwrap_or("");
    let user = settings.platform.user.as_deref().unwrap_or("");
    let hosts = settings.registry.hosts.as_deref().unwrap_or("");

    format!(
        r#"[platform]
; Base URL of the resource manager REST API (required for anything that
; talks to the cluster). Example: url = http://rm.example.com:8088
url = {}
; User to submit applications as (default: login user)
user = {}
; Submission queue and priority
queue = {}
priority = {}
; How many times the platform may restart a failed coordinator
restart_limit = {}
; Ceilings substituted when a component asks for "max" memory (MB) or cores
max_memory = {}
max_cores = {}

[store]
; Directory holding one subdirectory per instance definition
directory = {}
; How long to wait for an instance lock (milliseconds)
lock_timeout_ms = {}

[launch]
; How long to wait for a submitted application to be accepted (seconds)
accept_timeout_secs = {}
; Polling back-off bounds while waiting on application state (milliseconds)
poll_interval_ms = {}
poll_max_interval_ms = {}

[rpc]
; Coordinator RPC timeouts (seconds)
connect_timeout_secs = {}
request_timeout_secs = {}

[registry]
; Comma-separated ZooKeeper quorum used to derive zookeeper.hosts
hosts = {}
port = {}

[logging]
file = {}
"#,
        url,
        user,
        settings.platform.queue,
        settings.platform.priority,
        settings.platform.restart_limit,
        settings.platform.max_memory,
        settings.platform.max_cores,
        path_to_string(&settings.store.directory),
        settings.store.lock_timeout_ms,
        settings.launch.accept_timeout_secs,
        settings.launch.poll_interval_ms,
        settings.launch.poll_max_interval_ms,
        settings.rpc.connect_timeout_secs,
        settings.rpc.request_timeout_secs,
        hosts,
        settings.registry.port,
        path_to_string(&settings.logging.file),
    )
}

/// Render a path, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
