//! corral - control-plane client for long-running cluster application instances
//!
//! An instance is described by an [`AggregateConf`](conf::AggregateConf):
//! three layered configuration trees (resources, application configuration
//! and internal bookkeeping) persisted in an [`InstanceStore`](store::InstanceStore).
//! When running, an instance is an application on the cluster resource
//! manager whose coordinator is reachable over RPC.
//!
//! # High-Level API
//!
//! The [`lifecycle`] module runs intents (build, launch, flex, freeze,
//! destroy, status) against a [`Session`](lifecycle::Session):
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use corral::config::ClientSettings;
//! use corral::lifecycle::{LifecycleOrchestrator, Session};
//!
//! let session = Session::connect(&ClientSettings::load()?)?;
//! let orchestrator = LifecycleOrchestrator::new(&session);
//! let outcome = orchestrator.flex("demo", &BTreeMap::from([("worker".to_string(), 5)]))?;
//! println!("changed: {}", outcome.changed);
//! ```

pub mod conf;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod provider;
pub mod rpc;
pub mod store;
pub mod time;

pub use error::{CorralError, CorralResult};

/// Version of the corral library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
