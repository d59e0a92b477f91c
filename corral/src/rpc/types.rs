//! Coordinator channel types and traits

use serde::{Deserialize, Serialize};

use crate::conf::{AggregateConf, ClusterDescription, ConfTree};
use crate::error::CorralResult;
use crate::platform::AppReport;

/// Lifecycle state of a single container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Requested,
    Starting,
    Live,
    Stopped,
    Failed,
    Destroyed,
}

/// A container the coordinator manages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterNode {
    /// Container id.
    pub name: String,
    pub role: String,
    pub host: String,
    pub state: NodeState,
    pub command: String,
    pub diagnostics: String,
    pub exit_code: i32,
    pub environment: Vec<String>,
}

/// RPC operations offered by a running coordinator.
///
/// All calls are synchronous and bounded by the channel's connect and
/// response timeouts; a timeout surfaces as a timed-out error.
pub trait CoordinatorChannel {
    /// Ask the coordinator to stop the instance.
    fn stop_cluster(&self, message: &str) -> CorralResult<()>;

    /// Push new resources. Returns true if the coordinator's plan changed.
    fn flex(&self, resources: &ConfTree) -> CorralResult<bool>;

    /// The coordinator's live status document.
    fn get_cluster_description(&self) -> CorralResult<ClusterDescription>;

    /// The definition the coordinator is running with.
    fn get_instance_definition(&self) -> CorralResult<AggregateConf>;

    /// Container ids of a role; an empty role lists every container.
    fn list_nodes(&self, role: &str) -> CorralResult<Vec<String>>;

    /// Details of one container.
    fn get_node(&self, id: &str) -> CorralResult<ClusterNode>;

    /// Kill one container. An unknown id is a no-such-node error.
    fn kill_container(&self, id: &str) -> CorralResult<()>;

    /// Make the coordinator exit with `exit_code` after `delay_ms`.
    fn am_suicide(&self, message: &str, exit_code: i32, delay_ms: u64) -> CorralResult<()>;

    /// Round-trip text through the coordinator.
    fn echo(&self, text: &str) -> CorralResult<String>;
}

/// Opens channels to the coordinator of a live application.
pub trait ChannelFactory: Send + Sync {
    fn connect(&self, report: &AppReport) -> CorralResult<Box<dyn CoordinatorChannel>>;
}
