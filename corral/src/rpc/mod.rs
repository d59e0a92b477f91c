//! Control channel to a running coordinator.

mod http;
mod types;

pub use http::{HttpChannel, HttpChannelFactory};
pub use types::{ChannelFactory, ClusterNode, CoordinatorChannel, NodeState};
