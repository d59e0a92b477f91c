//! INI parsing for the client configuration file.
//!
//! Every recognized key overlays the matching field of
//! [`ClientSettings::default()`]. Unknown sections and keys are ignored.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::SettingsError;
use super::settings::ClientSettings;

/// Parse a loaded INI document into settings.
pub(super) fn parse_ini(ini: &Ini) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    // [platform] section
    if let Some(section) = ini.section(Some("platform")) {
        if let Some(v) = non_empty(section, "url") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("platform", "url", v, "must be an http:// or https:// URL"));
            }
            settings.platform.url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = non_empty(section, "user") {
            settings.platform.user = Some(v.to_string());
        }
        if let Some(v) = non_empty(section, "queue") {
            settings.platform.queue = v.to_string();
        }
        if let Some(v) = section.get("priority") {
            settings.platform.priority =
                parse_number("platform", "priority", v, "expected an integer")?;
        }
        if let Some(v) = section.get("restart_limit") {
            settings.platform.restart_limit =
                parse_number("platform", "restart_limit", v, "expected a non-negative integer")?;
        }
        if let Some(v) = section.get("max_memory") {
            settings.platform.max_memory = parse_positive("platform", "max_memory", v)?;
        }
        if let Some(v) = section.get("max_cores") {
            settings.platform.max_cores = parse_positive("platform", "max_cores", v)?;
        }
    }

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = non_empty(section, "directory") {
            settings.store.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("lock_timeout_ms") {
            settings.store.lock_timeout_ms =
                parse_number("store", "lock_timeout_ms", v, "expected milliseconds")?;
        }
    }

    // [launch] section
    if let Some(section) = ini.section(Some("launch")) {
        if let Some(v) = section.get("accept_timeout_secs") {
            settings.launch.accept_timeout_secs =
                parse_number("launch", "accept_timeout_secs", v, "expected seconds")?;
        }
        if let Some(v) = section.get("poll_interval_ms") {
            let parsed: u64 = parse_number("launch", "poll_interval_ms", v, "expected milliseconds")?;
            if parsed == 0 {
                return Err(invalid("launch", "poll_interval_ms", v, "must be at least 1"));
            }
            settings.launch.poll_interval_ms = parsed;
        }
        if let Some(v) = section.get("poll_max_interval_ms") {
            settings.launch.poll_max_interval_ms =
                parse_number("launch", "poll_max_interval_ms", v, "expected milliseconds")?;
        }
        if settings.launch.poll_max_interval_ms < settings.launch.poll_interval_ms {
            return Err(invalid(
                "launch",
                "poll_max_interval_ms",
                &settings.launch.poll_max_interval_ms.to_string(),
                "must not be below poll_interval_ms",
            ));
        }
    }

    // [rpc] section
    if let Some(section) = ini.section(Some("rpc")) {
        if let Some(v) = section.get("connect_timeout_secs") {
            settings.rpc.connect_timeout_secs =
                parse_number("rpc", "connect_timeout_secs", v, "expected seconds")?;
        }
        if let Some(v) = section.get("request_timeout_secs") {
            settings.rpc.request_timeout_secs =
                parse_number("rpc", "request_timeout_secs", v, "expected seconds")?;
        }
    }

    // [registry] section
    if let Some(section) = ini.section(Some("registry")) {
        if let Some(v) = non_empty(section, "hosts") {
            settings.registry.hosts = Some(v.to_string());
        }
        if let Some(v) = section.get("port") {
            settings.registry.port =
                parse_number("registry", "port", v, "expected a port number (0-65535)")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            settings.logging.file = expand_tilde(v);
        }
    }

    Ok(settings)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<i64, SettingsError> {
    let parsed: i64 = parse_number(section, key, value, "expected a positive integer")?;
    if parsed <= 0 {
        return Err(invalid(section, key, value, "expected a positive integer"));
    }
    Ok(parsed)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(text: &str) -> Result<ClientSettings, SettingsError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, text).unwrap();
        ClientSettings::load_from(&config_path)
    }

    #[test]
    fn test_full_config() {
        let settings = load(
            r#"
[platform]
url = http://rm.example.com:8088/
user = alice
queue = batch
priority = 4
restart_limit = 5
max_memory = 16384
max_cores = 8

[store]
directory = /var/lib/corral
lock_timeout_ms = 750

[launch]
accept_timeout_secs = 30
poll_interval_ms = 100
poll_max_interval_ms = 1000

[rpc]
connect_timeout_secs = 3
request_timeout_secs = 20

[registry]
hosts = zk1,zk2,zk3
port = 2281

[logging]
file = /tmp/corral.log
"#,
        )
        .unwrap();

        assert_eq!(settings.platform.url.as_deref(), Some("http://rm.example.com:8088"));
        assert_eq!(settings.platform.user.as_deref(), Some("alice"));
        assert_eq!(settings.platform.queue, "batch");
        assert_eq!(settings.platform.priority, 4);
        assert_eq!(settings.platform.restart_limit, 5);
        assert_eq!(settings.platform.max_memory, 16384);
        assert_eq!(settings.platform.max_cores, 8);
        assert_eq!(settings.store.directory, PathBuf::from("/var/lib/corral"));
        assert_eq!(settings.store.lock_timeout_ms, 750);
        assert_eq!(settings.launch.accept_timeout_secs, 30);
        assert_eq!(settings.launch.poll_interval_ms, 100);
        assert_eq!(settings.launch.poll_max_interval_ms, 1000);
        assert_eq!(settings.rpc.connect_timeout_secs, 3);
        assert_eq!(settings.rpc.request_timeout_secs, 20);
        assert_eq!(settings.registry.hosts.as_deref(), Some("zk1,zk2,zk3"));
        assert_eq!(settings.registry.port, 2281);
        assert_eq!(settings.logging.file, PathBuf::from("/tmp/corral.log"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings = load(
            r#"
[platform]
queue = adhoc
"#,
        )
        .unwrap();

        assert_eq!(settings.platform.queue, "adhoc");
        assert_eq!(settings.platform.priority, DEFAULT_PRIORITY);
        assert_eq!(settings.store.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);
        assert_eq!(settings.registry.port, DEFAULT_REGISTRY_PORT);
        assert!(settings.platform.url.is_none());
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let settings = load(
            r#"
[platform]
url =
queue =
"#,
        )
        .unwrap();

        assert!(settings.platform.url.is_none());
        assert_eq!(settings.platform.queue, DEFAULT_QUEUE);
    }

    #[test]
    fn test_invalid_url() {
        let err = load(
            r#"
[platform]
url = rm.example.com:8088
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("platform.url"));
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(
            r#"
[registry]
port = 99999
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "port"));
    }

    #[test]
    fn test_non_positive_max_memory() {
        let err = load(
            r#"
[platform]
max_memory = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_poll_ceiling_below_interval() {
        let err = load(
            r#"
[launch]
poll_interval_ms = 500
poll_max_interval_ms = 100
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("poll_max_interval_ms"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/instances");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("instances"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
