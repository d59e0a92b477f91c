//! The two-level option tree.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::options::{merge_ignore_duplicate_keys, OptionMap, OptionMapExt};
use crate::error::{CorralError, CorralResult};

/// Global options plus per-component overrides.
///
/// A component that has been referenced always has at least an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfTree {
    /// Options that apply to every component.
    pub global: OptionMap,
    /// Per-component option maps, keyed by component name.
    pub components: BTreeMap<String, OptionMap>,
}

impl ConfTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Parse a tree from JSON. Unknown fields are ignored.
    pub fn from_json(json: &str) -> CorralResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CorralError::bad_config(format!("Unparseable configuration: {}", e)))
    }

    /// Render the tree as pretty-printed JSON.
    pub fn to_json(&self) -> CorralResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CorralError::Internal(format!("Failed to serialize configuration: {}", e)))
    }

    /// Load a tree from a JSON file. Read and parse failures name the file.
    pub fn load(path: &Path) -> CorralResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CorralError::bad_config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            CorralError::bad_config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    // =========================================================================
    // Global options
    // =========================================================================

    /// Get a global option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.global.option(key)
    }

    /// Set a global option.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.global.insert(key.into(), value.into());
    }

    /// Get a global option, failing with a configuration error naming the key.
    pub fn mandatory_option(&self, key: &str) -> CorralResult<&str> {
        self.global.mandatory_option(key)
    }

    /// Get an integer global option or a default.
    pub fn option_int(&self, key: &str, default: i64) -> CorralResult<i64> {
        self.global.option_int(key, default)
    }

    /// Set a global option only if it is absent.
    pub fn put_if_unset(&mut self, key: &str, value: impl Into<String>) {
        self.global.put_if_unset(key, value);
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Names of all components, in sorted order.
    pub fn component_names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Look up a component.
    pub fn component(&self, name: &str) -> Option<&OptionMap> {
        self.components.get(name)
    }

    /// Look up a component, failing with a configuration error naming it.
    pub fn mandatory_component(&self, name: &str) -> CorralResult<&OptionMap> {
        self.component(name)
            .ok_or_else(|| CorralError::bad_config(format!("Missing component {}", name)))
    }

    /// Get a component, creating an empty one if absent.
    pub fn get_or_add_component(&mut self, name: &str) -> &mut OptionMap {
        self.components.entry(name.to_string()).or_default()
    }

    /// Get an option from a component, or a default if either is absent.
    pub fn component_opt<'a>(&'a self, name: &str, key: &str, default: &'a str) -> &'a str {
        self.component(name)
            .and_then(|c| c.option(key))
            .unwrap_or(default)
    }

    /// Get an integer option from a component, or a default if either is absent.
    pub fn component_opt_int(&self, name: &str, key: &str, default: i64) -> CorralResult<i64> {
        match self.component(name) {
            Some(c) => c.option_int(key, default),
            None => Ok(default),
        }
    }

    // =========================================================================
    // Merging
    // =========================================================================

    /// Copy keys from `source` that are absent here. Never replaces a value.
    pub fn merge_without_overwrite(&mut self, source: &ConfTree) {
        for (k, v) in &source.global {
            self.global.put_if_unset(k, v.clone());
        }
        for (name, opts) in &source.components {
            let target = self.get_or_add_component(name);
            for (k, v) in opts {
                target.put_if_unset(k, v.clone());
            }
        }
    }

    /// Merge `source` into this tree. Values from `source` win on collision.
    pub fn merge(&mut self, source: &ConfTree) {
        self.global
            .extend(source.global.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.merge_components(&source.components);
    }

    /// Merge per-component option maps, creating components on demand.
    pub fn merge_components(&mut self, components: &BTreeMap<String, OptionMap>) {
        for (name, opts) in components {
            self.get_or_add_component(name)
                .extend(opts.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    /// Merge only the component options whose keys start with `prefix`.
    pub fn merge_components_prefix(
        &mut self,
        components: &BTreeMap<String, OptionMap>,
        prefix: &str,
        overwrite: bool,
    ) {
        for (name, opts) in components {
            self.get_or_add_component(name)
                .merge_prefixed(opts, prefix, overwrite);
        }
    }

    /// Load a JSON tree from `path` and merge it in.
    pub fn merge_file(&mut self, path: &Path) -> CorralResult<()> {
        let source = Self::load(path)?;
        debug!(path = %path.display(), "Merging configuration file");
        self.merge(&source);
        Ok(())
    }

    /// Copy every global key of `source` starting with `prefix`, keeping the full key.
    pub fn propagate_global_keys(&mut self, source: &ConfTree, prefix: &str) {
        self.global.merge_prefixed(&source.global, prefix, true);
    }

    /// Merge global `source` options in, first writer wins.
    ///
    /// Shadowed keys are logged at debug level and returned.
    pub fn merge_globals_ignore_duplicates(&mut self, source: &OptionMap) -> Vec<String> {
        let shadowed = merge_ignore_duplicate_keys(&mut self.global, source);
        if !shadowed.is_empty() {
            debug!(keys = ?shadowed, "Ignoring duplicate global keys");
        }
        shadowed
    }

    // =========================================================================
    // Validation and resolution
    // =========================================================================

    /// Check that no component name or option key is empty.
    pub fn validate(&self) -> CorralResult<()> {
        if self.global.keys().any(|k| k.trim().is_empty()) {
            return Err(CorralError::bad_config("Empty global option key"));
        }
        for (name, opts) in &self.components {
            if name.trim().is_empty() {
                return Err(CorralError::bad_config("Empty component name"));
            }
            if opts.keys().any(|k| k.trim().is_empty()) {
                return Err(CorralError::bad_config(format!(
                    "Empty option key in component {}",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Make every component a complete option set: globals overridden by explicit values.
    pub fn resolve(&mut self) {
        for opts in self.components.values_mut() {
            let mut merged = self.global.clone();
            merged.append(opts);
            *opts = merged;
        }
    }
}
