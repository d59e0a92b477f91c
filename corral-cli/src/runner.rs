//! CLI runner for common setup.
//!
//! Loads client settings, applies command-line overrides, initializes
//! logging and opens the session every lifecycle command runs against.

use tracing::info;

use corral::config::{config_file_path, ClientSettings};
use corral::lifecycle::Session;
use corral::logging::{init_logging, LoggingGuard};

use crate::commands::GlobalArgs;
use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded settings with command-line overrides applied
    settings: ClientSettings,
}

impl CliRunner {
    /// Load settings and initialize logging.
    ///
    /// `--config` selects the settings file; `--manager` and `--basepath`
    /// override the values read from it.
    pub fn new(global: &GlobalArgs) -> Result<Self, CliError> {
        let path = global.config.clone().unwrap_or_else(config_file_path);
        let mut settings = ClientSettings::load_from(&path)?;
        apply_overrides(&mut settings, global);

        let ansi = atty::is(atty::Stream::Stderr) && std::env::var_os("NO_COLOR").is_none();
        let logging_guard = init_logging(&settings.logging.file, global.debug, ansi)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            settings,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("corral v{}", corral::VERSION);
        info!("corral CLI: {} command", command);
    }

    /// Open a session against the configured resource manager.
    pub fn session(&self) -> Result<Session, CliError> {
        Ok(Session::connect(&self.settings)?)
    }
}

/// Apply command-line overrides on top of the loaded settings.
pub fn apply_overrides(settings: &mut ClientSettings, global: &GlobalArgs) {
    if let Some(manager) = &global.manager {
        settings.platform.url = Some(manager.trim_end_matches('/').to_string());
    }
    if let Some(basepath) = &global.basepath {
        settings.store.directory = basepath.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_overrides_replace_settings() {
        let mut settings = ClientSettings::default();
        let global = GlobalArgs {
            manager: Some("http://rm:8088/".into()),
            basepath: Some(PathBuf::from("/data/corral")),
            config: None,
            debug: false,
        };
        apply_overrides(&mut settings, &global);
        assert_eq!(settings.platform.url.as_deref(), Some("http://rm:8088"));
        assert_eq!(settings.store.directory, PathBuf::from("/data/corral"));
    }

    #[test]
    fn test_no_overrides_keeps_settings() {
        let mut settings = ClientSettings::default();
        settings.platform.url = Some("http://configured:8088".into());
        apply_overrides(&mut settings, &GlobalArgs::default());
        assert_eq!(settings.platform.url.as_deref(), Some("http://configured:8088"));
    }
}
