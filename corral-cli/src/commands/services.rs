//! Concrete implementations of the service traits.

use std::collections::BTreeMap;

use corral::conf::ClusterDescription;
use corral::lifecycle::{
    BuildRequest, ConfFormat, ExistsOutcome, FlexOutcome, FreezeOptions, FreezeOutcome,
    LaunchOptions, LaunchOutcome, LifecycleOrchestrator, Session,
};
use corral::platform::AppReport;
use corral::CorralResult;

use super::traits::{LifecycleService, Output};

// ============================================================================
// Console Output Implementation
// ============================================================================

/// Standard console output implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    /// Create a new console output.
    pub fn new() -> Self {
        Self
    }
}

impl Output for ConsoleOutput {
    fn println(&self, message: &str) {
        println!("{}", message);
    }
}

// ============================================================================
// Default Lifecycle Service Implementation
// ============================================================================

/// Lifecycle service backed by a [`LifecycleOrchestrator`] on a live session.
pub struct DefaultLifecycleService<'s> {
    orchestrator: LifecycleOrchestrator<'s>,
}

impl<'s> DefaultLifecycleService<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            orchestrator: LifecycleOrchestrator::new(session),
        }
    }
}

impl LifecycleService for DefaultLifecycleService<'_> {
    fn build(&self, name: &str, request: &BuildRequest) -> CorralResult<()> {
        self.orchestrator.build(name, request)
    }

    fn create(
        &self,
        name: &str,
        request: &BuildRequest,
        options: &LaunchOptions,
    ) -> CorralResult<LaunchOutcome> {
        self.orchestrator.create(name, request, options)
    }

    fn launch(&self, name: &str, options: &LaunchOptions) -> CorralResult<LaunchOutcome> {
        self.orchestrator.launch(name, options)
    }

    fn freeze(&self, name: &str, options: &FreezeOptions) -> CorralResult<FreezeOutcome> {
        self.orchestrator.freeze(name, options)
    }

    fn destroy(&self, name: &str) -> CorralResult<bool> {
        self.orchestrator.destroy(name)
    }

    fn exists(&self, name: &str, live: bool) -> CorralResult<ExistsOutcome> {
        self.orchestrator.exists(name, live)
    }

    fn flex(&self, name: &str, counts: &BTreeMap<String, i64>) -> CorralResult<FlexOutcome> {
        self.orchestrator.flex(name, counts)
    }

    fn list(&self, name: Option<&str>) -> CorralResult<Vec<AppReport>> {
        self.orchestrator.list(name)
    }

    fn status(&self, name: &str) -> CorralResult<ClusterDescription> {
        self.orchestrator.status(name)
    }

    fn getconf(&self, name: &str, format: ConfFormat) -> CorralResult<String> {
        self.orchestrator.getconf(name, format)
    }

    fn kill_container(&self, name: &str, id: &str) -> CorralResult<()> {
        self.orchestrator.kill_container(name, id)
    }

    fn am_suicide(
        &self,
        name: &str,
        message: &str,
        exit_code: i32,
        delay_ms: u64,
    ) -> CorralResult<()> {
        self.orchestrator.am_suicide(name, message, exit_code, delay_ms)
    }

    fn echo(&self, name: &str, text: &str) -> CorralResult<String> {
        self.orchestrator.echo(name, text)
    }
}
