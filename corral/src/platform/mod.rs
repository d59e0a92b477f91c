//! The cluster resource manager boundary.
//!
//! Everything the client needs from the platform goes through the
//! [`Platform`] trait: listing and finding applications, reports, submission
//! and force-kill. [`HttpPlatform`] is the production implementation;
//! [`monitor_to_state`] polls a submitted application with an explicit
//! deadline.

mod http;
mod monitor;
mod types;

pub use http::HttpPlatform;
pub use monitor::{build_exit_code, monitor_to_state, PollPolicy};
pub use types::{AppId, AppReport, AppState, FinalStatus, LaunchRequest, Platform, APP_TYPE};
