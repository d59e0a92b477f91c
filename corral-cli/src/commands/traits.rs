//! Core traits for the lifecycle command handler pattern.
//!
//! This module defines the interfaces that handlers depend on, enabling
//! dependency injection and testability.

use std::collections::BTreeMap;

use corral::conf::ClusterDescription;
use corral::lifecycle::{
    BuildRequest, ConfFormat, ExistsOutcome, FlexOutcome, FreezeOptions, FreezeOutcome,
    LaunchOptions, LaunchOutcome,
};
use corral::platform::AppReport;
use corral::CorralResult;

use crate::error::CliError;

// ============================================================================
// Output Trait - Abstracts console output
// ============================================================================

/// Trait for outputting messages to the user.
///
/// This abstraction allows handlers to produce output without depending on
/// `println!` directly, making them testable.
pub trait Output: Send + Sync {
    /// Print a line of text.
    fn println(&self, message: &str);

    /// Print an empty line.
    fn newline(&self) {
        self.println("");
    }

    /// Print a section header.
    fn header(&self, title: &str) {
        self.println(title);
        self.println(&"=".repeat(title.len()));
    }

    /// Print an indented line.
    fn indented(&self, message: &str) {
        self.println(&format!("  {}", message));
    }

    /// Print a warning message.
    fn warning(&self, message: &str) {
        self.println(&format!("Warning: {}", message));
    }

    /// Print a success message.
    fn success(&self, message: &str) {
        self.println(&format!("Success: {}", message));
    }
}

// ============================================================================
// Lifecycle Service Trait
// ============================================================================

/// Trait for instance lifecycle operations.
///
/// Abstracts the orchestrator so handlers can be tested without a resource
/// manager.
pub trait LifecycleService {
    fn build(&self, name: &str, request: &BuildRequest) -> CorralResult<()>;

    fn create(
        &self,
        name: &str,
        request: &BuildRequest,
        options: &LaunchOptions,
    ) -> CorralResult<LaunchOutcome>;

    fn launch(&self, name: &str, options: &LaunchOptions) -> CorralResult<LaunchOutcome>;

    fn freeze(&self, name: &str, options: &FreezeOptions) -> CorralResult<FreezeOutcome>;

    fn destroy(&self, name: &str) -> CorralResult<bool>;

    fn exists(&self, name: &str, live: bool) -> CorralResult<ExistsOutcome>;

    fn flex(&self, name: &str, counts: &BTreeMap<String, i64>) -> CorralResult<FlexOutcome>;

    fn list(&self, name: Option<&str>) -> CorralResult<Vec<AppReport>>;

    fn status(&self, name: &str) -> CorralResult<ClusterDescription>;

    fn getconf(&self, name: &str, format: ConfFormat) -> CorralResult<String>;

    fn kill_container(&self, name: &str, id: &str) -> CorralResult<()>;

    fn am_suicide(&self, name: &str, message: &str, exit_code: i32, delay_ms: u64)
        -> CorralResult<()>;

    fn echo(&self, name: &str, text: &str) -> CorralResult<String>;
}

// ============================================================================
// Command Context - Bundles dependencies for handlers
// ============================================================================

/// Context providing dependencies to command handlers.
pub struct CommandContext<'a> {
    /// Output interface for user messages.
    pub output: &'a dyn Output,

    /// Lifecycle operations.
    pub service: &'a dyn LifecycleService,
}

impl<'a> CommandContext<'a> {
    /// Create a new command context.
    pub fn new(output: &'a dyn Output, service: &'a dyn LifecycleService) -> Self {
        Self { output, service }
    }
}

// ============================================================================
// Command Handler Trait
// ============================================================================

/// Trait for command handlers.
///
/// Each subcommand has a handler that implements this trait. Handlers return
/// the process exit code for outcomes that are not errors.
pub trait CommandHandler {
    /// The arguments type for this handler.
    type Args;

    /// Execute the command with the given arguments and context.
    fn execute(args: Self::Args, ctx: &CommandContext<'_>) -> Result<i32, CliError>;
}
