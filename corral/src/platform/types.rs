//! Platform types and traits

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conf::OptionMap;
use crate::error::CorralResult;
use crate::provider::LocalResource;

/// Application type under which instances are registered with the platform.
pub const APP_TYPE: &str = "corral";

/// Platform-assigned application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application state as reported by the platform.
///
/// Ordered: every state from [`AppState::Finished`] on is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    New,
    NewSaving,
    Submitted,
    Accepted,
    Running,
    Finished,
    Failed,
    Killed,
}

impl AppState {
    pub fn is_terminal(self) -> bool {
        self >= Self::Finished
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::NewSaving => "NEW_SAVING",
            Self::Submitted => "SUBMITTED",
            Self::Accepted => "ACCEPTED",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        };
        f.write_str(s)
    }
}

/// Final outcome accompanying a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    #[default]
    Undefined,
    Succeeded,
    Failed,
    Killed,
}

/// The platform's view of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppReport {
    pub id: AppId,
    pub name: String,
    pub app_type: String,
    pub user: String,
    pub queue: String,
    pub state: AppState,
    pub final_status: FinalStatus,
    pub diagnostics: String,
    /// Coordinator RPC endpoint, once it has registered.
    pub rpc_address: Option<String>,
    pub tracking_url: Option<String>,
    /// Milliseconds since the epoch.
    pub start_time: i64,
    pub finish_time: i64,
}

impl AppReport {
    /// True while the application has not reached a terminal state.
    pub fn is_live(&self) -> bool {
        !self.state.is_terminal()
    }
}

/// Everything needed to submit a coordinator to the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    pub name: String,
    pub app_type: String,
    pub queue: String,
    pub priority: i32,
    pub max_attempts: u32,
    pub keep_containers_over_restarts: bool,
    pub memory: i64,
    pub cores: i64,
    pub command: Vec<String>,
    pub env: OptionMap,
    pub resources: Vec<LocalResource>,
}

/// The cluster resource manager.
///
/// Implementations submit, report on and kill applications. Lookups by
/// instance name only consider applications of type [`APP_TYPE`] owned by
/// [`Platform::user`].
pub trait Platform: Send + Sync {
    /// The user applications are submitted as.
    fn user(&self) -> String;

    /// All applications of `app_type` owned by the user.
    fn list_instances(&self, app_type: &str) -> CorralResult<Vec<AppReport>>;

    /// Current report of one application, `None` if the platform has no record.
    fn report(&self, id: &AppId) -> CorralResult<Option<AppReport>>;

    /// Submit an application and return its id.
    fn submit(&self, request: &LaunchRequest) -> CorralResult<AppId>;

    /// Force-kill an application.
    fn kill(&self, id: &AppId, reason: &str) -> CorralResult<()>;

    /// The most recently started application of this name, live or not.
    fn find_instance(&self, name: &str) -> CorralResult<Option<AppReport>> {
        Ok(self
            .list_instances(APP_TYPE)?
            .into_iter()
            .filter(|r| r.name == name)
            .max_by_key(|r| r.start_time))
    }

    /// Every live application of this name.
    fn find_live_instances(&self, name: &str) -> CorralResult<Vec<AppReport>> {
        Ok(self
            .list_instances(APP_TYPE)?
            .into_iter()
            .filter(|r| r.name == name && r.is_live())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order_and_terminal() {
        assert!(AppState::New < AppState::NewSaving);
        assert!(AppState::Accepted < AppState::Running);
        assert!(AppState::Running < AppState::Finished);
        assert!(AppState::Failed < AppState::Killed);
        assert!(!AppState::Running.is_terminal());
        assert!(AppState::Finished.is_terminal());
        assert!(AppState::Killed.is_terminal());
    }

    #[test]
    fn test_state_wire_names() {
        let json = serde_json::to_string(&AppState::NewSaving).unwrap();
        assert_eq!(json, "\"NEW_SAVING\"");
        let state: AppState = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(state, AppState::Running);
        assert_eq!(AppState::Killed.to_string(), "KILLED");
    }
}
