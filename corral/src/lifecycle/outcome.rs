//! Results of lifecycle intents that are not simply success or error.

use std::fmt;
use std::str::FromStr;

use crate::conf::ClusterDescription;
use crate::error::exit_codes::*;
use crate::error::CorralError;
use crate::platform::{build_exit_code, AppId, AppReport, AppState};

/// Result of submitting an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOutcome {
    pub app_id: AppId,
    /// Last report seen; `None` when a bounded wait ran out.
    pub report: Option<AppReport>,
    /// True if the application was force-killed after a wait ran out.
    pub killed: bool,
}

impl LaunchOutcome {
    pub fn exit_code(&self) -> i32 {
        build_exit_code(self.report.as_ref())
    }

    /// True if the last report shows the application running.
    pub fn is_running(&self) -> bool {
        self.report
            .as_ref()
            .is_some_and(|r| r.state == AppState::Running)
    }
}

/// Result of stopping an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum FreezeOutcome {
    /// No application of that name was found.
    NotRunning,
    /// The most recent application had already terminated.
    AlreadyTerminated(AppState),
    /// The stop (or kill) was issued and, if requested, completed.
    Stopped(AppId),
    /// The coordinator could not be asked to stop.
    StopFailed { app_id: AppId, reason: String },
    /// The application did not terminate within the wait.
    WaitTimedOut(AppId),
}

impl FreezeOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StopFailed { .. } | Self::WaitTimedOut(_) => EXIT_FALSE,
            _ => EXIT_SUCCESS,
        }
    }
}

/// Result of changing component counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexOutcome {
    /// The requested size differs from the previous one.
    pub changed: bool,
    /// A live coordinator was told about the change.
    pub pushed_live: bool,
    /// The durable definition was updated.
    pub saved: bool,
}

impl FlexOutcome {
    pub fn exit_code(&self) -> i32 {
        if self.changed {
            EXIT_SUCCESS
        } else {
            EXIT_FALSE
        }
    }
}

/// Result of an existence probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ExistsOutcome {
    /// A durable definition exists; liveness was not checked.
    Defined,
    /// The instance is running.
    Live(AppReport),
    /// The instance is defined but not running; carries the last known state.
    NotLive(Option<AppState>),
}

impl ExistsOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotLive(_) => EXIT_FALSE,
            _ => EXIT_SUCCESS,
        }
    }
}

/// Rendering of client configuration for `getconf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfFormat {
    #[default]
    Xml,
    Properties,
}

impl ConfFormat {
    pub fn render(self, description: &ClusterDescription) -> String {
        match self {
            Self::Xml => description.client_properties_xml(),
            Self::Properties => description.client_properties_text(),
        }
    }
}

impl FromStr for ConfFormat {
    type Err = CorralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "properties" => Ok(Self::Properties),
            other => Err(CorralError::bad_args(format!("Unknown format: {}", other))),
        }
    }
}

impl fmt::Display for ConfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => write!(f, "xml"),
            Self::Properties => write!(f, "properties"),
        }
    }
}
