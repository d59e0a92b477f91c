//! Polling an application towards a desired state.

use std::time::Duration;

use tracing::{debug, info};

use super::types::{AppId, AppReport, AppState, FinalStatus, Platform};
use crate::error::exit_codes::*;
use crate::error::CorralResult;
use crate::time::{Backoff, Deadline};

/// How often to poll while waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub initial: Duration,
    /// Ceiling the delay doubles up to.
    pub max: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(2),
        }
    }
}

/// Poll until the application reaches `desired` or any later state.
///
/// The platform is polled at least once. Returns the report that satisfied
/// the wait, or `None` if the deadline passed first or the platform lost
/// track of the application.
pub fn monitor_to_state(
    platform: &dyn Platform,
    id: &AppId,
    desired: AppState,
    deadline: Deadline,
    policy: PollPolicy,
) -> CorralResult<Option<AppReport>> {
    let mut backoff = Backoff::new(policy.initial, policy.max);
    loop {
        let report = match platform.report(id)? {
            Some(report) => report,
            None => {
                debug!(app = %id, "Platform has no report for application");
                return Ok(None);
            }
        };
        debug!(app = %id, state = %report.state, "Polled application state");

        if report.state >= desired {
            info!(app = %id, state = %report.state, "Application reached {}", desired);
            return Ok(Some(report));
        }
        if !backoff.sleep_within(&deadline) {
            info!(app = %id, state = %report.state, "Timed out waiting for {}", desired);
            return Ok(None);
        }
    }
}

/// Map a monitored report onto an exit code.
///
/// No report means the wait timed out.
pub fn build_exit_code(report: Option<&AppReport>) -> i32 {
    let Some(report) = report else {
        return EXIT_TIMED_OUT;
    };
    match report.state {
        AppState::Finished if report.final_status == FinalStatus::Succeeded => EXIT_SUCCESS,
        AppState::Finished => EXIT_SERVICE_FINISHED_WITH_ERROR,
        AppState::Killed => EXIT_SERVICE_KILLED,
        AppState::Failed => EXIT_SERVICE_FAILED,
        _ => EXIT_SUCCESS,
    }
}
