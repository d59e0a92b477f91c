//! Error types and process exit codes.
//!
//! Every failure in the library is a [`CorralError`]. Each variant carries a
//! numeric exit code (see [`exit_codes`]) so the CLI boundary can map a
//! result straight onto the process exit status.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Numeric exit codes forming the process-boundary contract.
pub mod exit_codes {
    /// Success.
    pub const EXIT_SUCCESS: i32 = 0;
    /// The operation completed but the answer is "no" (not running, no change).
    pub const EXIT_FALSE: i32 = 1;
    /// Bad command-line arguments.
    pub const EXIT_COMMAND_ARGUMENT_ERROR: i32 = 40;
    /// Bad or incomplete configuration.
    pub const EXIT_BAD_CONFIGURATION: i32 = 41;

    const EXIT_CODE_BASE: i32 = 64;

    /// Internal error.
    pub const EXIT_INTERNAL_ERROR: i32 = EXIT_CODE_BASE;
    /// Unimplemented action.
    pub const EXIT_UNIMPLEMENTED: i32 = 65;
    /// The platform reports the application failed.
    pub const EXIT_SERVICE_FAILED: i32 = 66;
    /// The platform reports the application was killed.
    pub const EXIT_SERVICE_KILLED: i32 = 67;
    /// Monitoring timed out.
    pub const EXIT_TIMED_OUT: i32 = 68;
    /// The application finished with an error.
    pub const EXIT_SERVICE_FINISHED_WITH_ERROR: i32 = 69;
    /// The instance name is unknown.
    pub const EXIT_UNKNOWN_INSTANCE: i32 = 70;
    /// The instance is in the wrong state for the operation.
    pub const EXIT_BAD_STATE: i32 = 71;
    /// A spawned coordinator process failed.
    pub const EXIT_PROCESS_FAILED: i32 = 72;
    /// Too many failures triggered a deployment failure.
    pub const EXIT_DEPLOYMENT_FAILED: i32 = 73;
    /// The instance is live and the operation requires it not to be.
    pub const EXIT_APPLICATION_IN_USE: i32 = 74;
    /// An instance of that name already exists.
    pub const EXIT_INSTANCE_EXISTS: i32 = 75;
}

use exit_codes::*;

/// Errors raised by configuration, storage, platform and RPC operations.
#[derive(Debug, Error)]
pub enum CorralError {
    /// Malformed, missing or conflicting configuration.
    #[error("Bad configuration: {0}")]
    BadConfig(String),

    /// Invalid command arguments.
    #[error("Bad argument: {0}")]
    BadCommandArguments(String),

    /// No instance of that name is known.
    #[error("Unknown application instance: {0}")]
    UnknownInstance(String),

    /// The instance is in the wrong state for the requested operation.
    #[error("Bad instance state: {0}")]
    BadClusterState(String),

    /// The instance is live and the requested operation requires it not to be.
    #[error("{name}: {detail}")]
    InstanceInUse { name: String, detail: String },

    /// A durable definition already exists for the instance.
    #[error("Application instance \"{0}\" already exists")]
    InstanceExists(String),

    /// The advisory lock on an instance directory could not be acquired.
    #[error("Failed to acquire {kind} lock {}", path.display())]
    LockAcquireFailed { kind: &'static str, path: PathBuf },

    /// A bounded wait or RPC call timed out.
    #[error("Timed out: {0}")]
    TimedOut(String),

    /// The platform reported a terminal failure.
    #[error("Application failed: {0}")]
    ServiceFailed(String),

    /// The platform reported the application was killed.
    #[error("Application killed: {0}")]
    ServiceKilled(String),

    /// The application finished with a non-success status.
    #[error("Application finished with an error: {0}")]
    ServiceFinishedWithError(String),

    /// The coordinator process failed.
    #[error("Process failed: {0}")]
    ProcessFailed(String),

    /// Too many container failures.
    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),

    /// Error communicating with the platform.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Error communicating with the coordinator.
    #[error("Coordinator RPC error: {0}")]
    Rpc(String),

    /// The coordinator does not know the requested node or container.
    #[error("No such node: {0}")]
    NoSuchNode(String),

    /// File system error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Action not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type used throughout the library.
pub type CorralResult<T> = Result<T, CorralError>;

impl CorralError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BadConfig(_) => EXIT_BAD_CONFIGURATION,
            Self::BadCommandArguments(_) => EXIT_COMMAND_ARGUMENT_ERROR,
            Self::UnknownInstance(_) => EXIT_UNKNOWN_INSTANCE,
            Self::BadClusterState(_) | Self::NoSuchNode(_) => EXIT_BAD_STATE,
            Self::InstanceInUse { .. } => EXIT_APPLICATION_IN_USE,
            Self::InstanceExists(_) => EXIT_INSTANCE_EXISTS,
            Self::LockAcquireFailed { .. } => EXIT_BAD_STATE,
            Self::TimedOut(_) => EXIT_TIMED_OUT,
            Self::ServiceFailed(_) => EXIT_SERVICE_FAILED,
            Self::ServiceKilled(_) => EXIT_SERVICE_KILLED,
            Self::ServiceFinishedWithError(_) => EXIT_SERVICE_FINISHED_WITH_ERROR,
            Self::ProcessFailed(_) => EXIT_PROCESS_FAILED,
            Self::DeploymentFailed(_) => EXIT_DEPLOYMENT_FAILED,
            Self::Rpc(_) => EXIT_TIMED_OUT,
            Self::Platform(_) => EXIT_SERVICE_FAILED,
            Self::Unimplemented(_) => EXIT_UNIMPLEMENTED,
            Self::Io { .. } | Self::Internal(_) => EXIT_INTERNAL_ERROR,
        }
    }

    /// Build a configuration error from a message.
    pub fn bad_config(msg: impl Into<String>) -> Self {
        Self::BadConfig(msg.into())
    }

    /// Build a command-argument error from a message.
    pub fn bad_args(msg: impl Into<String>) -> Self {
        Self::BadCommandArguments(msg.into())
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True if this is a lock acquisition failure.
    pub fn is_lock_failure(&self) -> bool {
        matches!(self, Self::LockAcquireFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_match_contract() {
        assert_eq!(CorralError::bad_config("x").exit_code(), 41);
        assert_eq!(CorralError::bad_args("x").exit_code(), 40);
        assert_eq!(CorralError::UnknownInstance("a".into()).exit_code(), 70);
        assert_eq!(CorralError::BadClusterState("a".into()).exit_code(), 71);
        assert_eq!(
            CorralError::InstanceInUse {
                name: "a".into(),
                detail: "running".into()
            }
            .exit_code(),
            74
        );
        assert_eq!(CorralError::InstanceExists("a".into()).exit_code(), 75);
        assert_eq!(CorralError::TimedOut("a".into()).exit_code(), 68);
        assert_eq!(CorralError::Unimplemented("a".into()).exit_code(), 65);
        assert_eq!(CorralError::Internal("a".into()).exit_code(), 64);
    }

    #[test]
    fn test_display_names_lock_path() {
        let err = CorralError::LockAcquireFailed {
            kind: "write",
            path: PathBuf::from("/data/instances/demo/writelock"),
        };
        let text = err.to_string();
        assert!(text.contains("write lock"));
        assert!(text.contains("/data/instances/demo/writelock"));
        assert!(err.is_lock_failure());
    }

    #[test]
    fn test_io_error_has_source() {
        let err = CorralError::io(
            "/tmp/x",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.exit_code(), EXIT_INTERNAL_ERROR);
    }
}
