//! Layered, mergeable instance configuration.
//!
//! An instance is described by an [`AggregateConf`]: three [`ConfTree`]s
//! (resources, application configuration and internal bookkeeping). Each tree
//! holds global options and per-component overrides; resolving a tree turns
//! every component into a concrete option set.
//!
//! # Example
//!
//! ```
//! use corral::conf::{AggregateConf, keys};
//!
//! let mut conf = AggregateConf::new("demo");
//! conf.resources_mut().set(keys::RESOURCE_MEMORY, "512");
//! conf.resources_mut().get_or_add_component("worker");
//! conf.resolve().unwrap();
//!
//! let memory = conf
//!     .resources()
//!     .unwrap()
//!     .component_opt("worker", keys::RESOURCE_MEMORY, "");
//! assert_eq!(memory, "512");
//! ```

mod aggregate;
mod description;
pub mod keys;
mod options;
mod tree;

pub use aggregate::AggregateConf;
pub use description::{ClusterDescription, DescriptionState};
pub use options::{decode_int, merge_ignore_duplicate_keys, OptionMap, OptionMapExt};
pub use tree::ConfTree;
