//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and the exit code each failure maps to.

use std::fmt;
use std::path::PathBuf;
use std::process;

use corral::config::SettingsError;
use corral::error::exit_codes::{EXIT_BAD_CONFIGURATION, EXIT_INTERNAL_ERROR};
use corral::CorralError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Client configuration file error
    Config(SettingsError),
    /// A lifecycle operation failed
    Corral(CorralError),
    /// Failed to write output file
    FileWrite {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Corral(e) => e.exit_code(),
            CliError::Config(_) => EXIT_BAD_CONFIGURATION,
            CliError::LoggingInit(_) | CliError::FileWrite { .. } => EXIT_INTERNAL_ERROR,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Corral(CorralError::InstanceInUse { name, .. }) => {
                eprintln!();
                eprintln!("Stop the running instance first:");
                eprintln!("  corral freeze {}", name);
            }
            CliError::Corral(CorralError::UnknownInstance(_)) => {
                eprintln!();
                eprintln!("Use 'corral list' to see instances known to the resource manager.");
            }
            CliError::Corral(CorralError::Platform(_)) | CliError::Corral(CorralError::Rpc(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Wrong resource manager URL: check --manager or [platform] url");
                eprintln!("  2. The coordinator is still starting and has no RPC address yet");
                eprintln!("  3. Timeouts too short: see the [rpc] section of config.ini");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Fix the value in config.ini, or regenerate it with 'corral init'.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Corral(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Corral(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<CorralError> for CliError {
    fn from(e: CorralError) -> Self {
        CliError::Corral(e)
    }
}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral::error::exit_codes::*;

    #[test]
    fn test_exit_code_follows_library_error() {
        let err = CliError::from(CorralError::UnknownInstance("demo".into()));
        assert_eq!(err.exit_code(), EXIT_UNKNOWN_INSTANCE);

        let err = CliError::from(CorralError::InstanceInUse {
            name: "demo".into(),
            detail: "running".into(),
        });
        assert_eq!(err.exit_code(), EXIT_APPLICATION_IN_USE);
    }

    #[test]
    fn test_config_error_is_bad_configuration() {
        let err = CliError::from(SettingsError::WriteError("disk full".into()));
        assert_eq!(err.exit_code(), EXIT_BAD_CONFIGURATION);
        assert!(err.to_string().contains("disk full"));
    }
}
