//! Coordinator channel over JSON/HTTP.
//!
//! Each RPC is a `POST <address>/rpc/<method>` whose body and response are
//! JSON objects. On node calls a 404 answer carries a no-such-node
//! condition; anywhere else it means the address is not a coordinator.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::types::{ChannelFactory, ClusterNode, CoordinatorChannel};
use crate::conf::{AggregateConf, ClusterDescription, ConfTree};
use crate::error::{CorralError, CorralResult};
use crate::http::{HttpClient, HttpError, ReqwestClient, Timeouts};
use crate::platform::AppReport;

#[derive(Debug, Serialize, Deserialize)]
struct FlexResponse {
    changed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeList {
    #[serde(default)]
    nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EchoResponse {
    text: String,
}

/// Channel to one coordinator.
pub struct HttpChannel {
    client: Arc<dyn HttpClient>,
    address: String,
}

impl HttpChannel {
    pub fn new(client: Arc<dyn HttpClient>, address: &str) -> Self {
        Self {
            client,
            address: address.trim_end_matches('/').to_string(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> CorralResult<T> {
        self.call_with(method, body, rpc_error)
    }

    /// A call addressing one container, where 404 means the node is unknown.
    fn call_on_node<T: DeserializeOwned>(&self, method: &str, body: Value) -> CorralResult<T> {
        self.call_with(method, body, node_error)
    }

    fn call_with<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
        on_error: fn(&str, HttpError) -> CorralError,
    ) -> CorralResult<T> {
        let url = format!("{}/rpc/{}", self.address, method);
        trace!(%url, "RPC call");
        let bytes = self
            .client
            .post_json(&url, &body.to_string())
            .map_err(|e| on_error(method, e))?;
        if bytes.is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|e| CorralError::Rpc(format!("{}: empty response: {}", method, e)));
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| CorralError::Rpc(format!("{}: unparseable response: {}", method, e)))
    }
}

fn rpc_error(method: &str, e: HttpError) -> CorralError {
    match e {
        HttpError::Timeout(detail) => {
            CorralError::TimedOut(format!("coordinator call {}: {}", method, detail))
        }
        other => CorralError::Rpc(format!("coordinator call {} failed: {}", method, other)),
    }
}

fn node_error(method: &str, e: HttpError) -> CorralError {
    match e {
        HttpError::Status { status: 404, body } => CorralError::NoSuchNode(body),
        other => rpc_error(method, other),
    }
}

impl CoordinatorChannel for HttpChannel {
    fn stop_cluster(&self, message: &str) -> CorralResult<()> {
        self.call::<Value>("stop_cluster", json!({ "message": message }))?;
        Ok(())
    }

    fn flex(&self, resources: &ConfTree) -> CorralResult<bool> {
        let response: FlexResponse = self.call("flex", json!({ "resources": resources }))?;
        debug!(changed = response.changed, "Coordinator flexed");
        Ok(response.changed)
    }

    fn get_cluster_description(&self) -> CorralResult<ClusterDescription> {
        self.call("get_cluster_description", json!({}))
    }

    fn get_instance_definition(&self) -> CorralResult<AggregateConf> {
        self.call("get_instance_definition", json!({}))
    }

    fn list_nodes(&self, role: &str) -> CorralResult<Vec<String>> {
        let list: NodeList = self.call("list_nodes", json!({ "role": role }))?;
        Ok(list.nodes)
    }

    fn get_node(&self, id: &str) -> CorralResult<ClusterNode> {
        self.call_on_node("get_node", json!({ "id": id }))
    }

    fn kill_container(&self, id: &str) -> CorralResult<()> {
        self.call_on_node::<Value>("kill_container", json!({ "id": id }))?;
        Ok(())
    }

    fn am_suicide(&self, message: &str, exit_code: i32, delay_ms: u64) -> CorralResult<()> {
        self.call::<Value>(
            "am_suicide",
            json!({ "message": message, "exitCode": exit_code, "delay": delay_ms }),
        )?;
        Ok(())
    }

    fn echo(&self, text: &str) -> CorralResult<String> {
        let response: EchoResponse = self.call("echo", json!({ "text": text }))?;
        Ok(response.text)
    }
}

/// Opens [`HttpChannel`]s from application reports.
pub struct HttpChannelFactory {
    client: Arc<dyn HttpClient>,
}

impl HttpChannelFactory {
    /// A factory with a fresh reqwest client.
    pub fn new(timeouts: Timeouts) -> CorralResult<Self> {
        let client = ReqwestClient::new(timeouts).map_err(|e| CorralError::Rpc(e.to_string()))?;
        Ok(Self::with_client(Arc::new(client)))
    }

    pub fn with_client(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }
}

impl ChannelFactory for HttpChannelFactory {
    fn connect(&self, report: &AppReport) -> CorralResult<Box<dyn CoordinatorChannel>> {
        let address = report.rpc_address.as_deref().ok_or_else(|| {
            CorralError::BadClusterState(format!(
                "Application {} has not registered a coordinator address (state {})",
                report.id, report.state
            ))
        })?;
        debug!(app = %report.id, address, "Connecting to coordinator");
        Ok(Box::new(HttpChannel::new(Arc::clone(&self.client), address)))
    }
}
