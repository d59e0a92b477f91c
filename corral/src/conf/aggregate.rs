//! The complete definition of an application instance.

use serde::{Deserialize, Serialize};

use super::tree::ConfTree;
use crate::error::{CorralError, CorralResult};

/// Resources, application configuration and internal bookkeeping for one instance.
///
/// The instance is complete only when all three trees are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregateConf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ConfTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_conf: Option<ConfTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<ConfTree>,
}

impl AggregateConf {
    /// A complete, empty definition for the named instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::from_trees(ConfTree::new(), ConfTree::new(), ConfTree::new())
        }
    }

    /// Assemble a definition from its three trees.
    pub fn from_trees(resources: ConfTree, app_conf: ConfTree, internal: ConfTree) -> Self {
        Self {
            name: None,
            resources: Some(resources),
            app_conf: Some(app_conf),
            internal: Some(internal),
        }
    }

    /// True when all three trees are present.
    pub fn is_complete(&self) -> bool {
        self.resources.is_some() && self.app_conf.is_some() && self.internal.is_some()
    }

    /// Check completeness and the shape of every tree.
    pub fn validate(&self) -> CorralResult<()> {
        if !self.is_complete() {
            return Err(CorralError::bad_config(format!(
                "Incomplete instance definition{}",
                self.name
                    .as_deref()
                    .map(|n| format!(" for {}", n))
                    .unwrap_or_default()
            )));
        }
        self.resources()?.validate()?;
        self.internal()?.validate()?;
        self.app_conf()?.validate()
    }

    /// Validate, then resolve each tree so every component is a concrete option set.
    pub fn resolve(&mut self) -> CorralResult<()> {
        self.validate()?;
        for tree in [&mut self.resources, &mut self.internal, &mut self.app_conf]
            .into_iter()
            .flatten()
        {
            tree.resolve();
        }
        Ok(())
    }

    /// A resolved copy, leaving this definition untouched.
    pub fn resolved(&self) -> CorralResult<Self> {
        let mut copy = self.clone();
        copy.resolve()?;
        Ok(copy)
    }

    pub fn resources(&self) -> CorralResult<&ConfTree> {
        self.resources.as_ref().ok_or_else(|| missing("resources"))
    }

    pub fn app_conf(&self) -> CorralResult<&ConfTree> {
        self.app_conf.as_ref().ok_or_else(|| missing("appConf"))
    }

    pub fn internal(&self) -> CorralResult<&ConfTree> {
        self.internal.as_ref().ok_or_else(|| missing("internal"))
    }

    /// Mutable access to the resources tree, creating it if absent.
    pub fn resources_mut(&mut self) -> &mut ConfTree {
        self.resources.get_or_insert_with(ConfTree::new)
    }

    /// Mutable access to the application configuration tree, creating it if absent.
    pub fn app_conf_mut(&mut self) -> &mut ConfTree {
        self.app_conf.get_or_insert_with(ConfTree::new)
    }

    /// Mutable access to the internal tree, creating it if absent.
    pub fn internal_mut(&mut self) -> &mut ConfTree {
        self.internal.get_or_insert_with(ConfTree::new)
    }

    pub fn to_json(&self) -> CorralResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CorralError::Internal(format!("Failed to serialize definition: {}", e)))
    }

    pub fn from_json(json: &str) -> CorralResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CorralError::bad_config(format!("Unparseable instance definition: {}", e)))
    }
}

fn missing(tree: &str) -> CorralError {
    CorralError::bad_config(format!("Instance definition has no {} section", tree))
}
