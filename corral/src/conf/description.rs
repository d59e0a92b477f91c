//! Live status document describing a running instance.
//!
//! The coordinator returns a [`ClusterDescription`] from `get_cluster_description`.
//! The same structure can be derived locally from an instance definition, which
//! is how the coordinator builds its first report.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::AggregateConf;
use super::keys;
use super::options::{merge_ignore_duplicate_keys, OptionMap, OptionMapExt};
use crate::error::{CorralError, CorralResult};

/// Instance state as reported by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionState {
    #[default]
    Incomplete,
    Submitted,
    Created,
    Live,
    Stopped,
    Destroyed,
}

/// Status document for an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub app_type: String,
    pub state: DescriptionState,
    /// Milliseconds since the epoch.
    pub create_time: i64,
    pub update_time: i64,
    pub options: OptionMap,
    pub info: OptionMap,
    pub roles: BTreeMap<String, OptionMap>,
    pub statistics: BTreeMap<String, BTreeMap<String, i64>>,
    /// Container ids per role.
    pub instances: BTreeMap<String, Vec<String>>,
    /// Properties a client needs to talk to the application.
    pub client_properties: OptionMap,
}

impl ClusterDescription {
    /// Derive a description from an instance definition.
    ///
    /// Globals are merged internal first, then resources, then appConf; the
    /// first writer of a key wins. Roles merge resources before appConf.
    pub fn from_aggregate(definition: &AggregateConf) -> CorralResult<Self> {
        let conf = definition.resolved()?;
        let mut cd = Self {
            name: conf.name.clone().unwrap_or_default(),
            state: DescriptionState::Live,
            ..Self::default()
        };

        for tree in [conf.internal()?, conf.resources()?, conf.app_conf()?] {
            let shadowed = merge_ignore_duplicate_keys(&mut cd.options, &tree.global);
            if !shadowed.is_empty() {
                debug!(keys = ?shadowed, "Duplicate option keys ignored in description");
            }
        }
        for tree in [conf.resources()?, conf.app_conf()?] {
            for (name, opts) in &tree.components {
                let role = cd.roles.entry(name.clone()).or_default();
                merge_ignore_duplicate_keys(role, opts);
            }
        }

        cd.app_type = conf
            .internal()?
            .get(keys::INTERNAL_APPLICATION_TYPE)
            .unwrap_or("agent")
            .to_string();
        Ok(cd)
    }

    /// Get a role option or a default.
    pub fn role_opt<'a>(&'a self, role: &str, key: &str, default: &'a str) -> &'a str {
        self.roles
            .get(role)
            .and_then(|r| r.option(key))
            .unwrap_or(default)
    }

    /// Desired instance count of a role, zero if unset.
    pub fn desired_instances(&self, role: &str) -> CorralResult<i64> {
        match self.roles.get(role) {
            Some(r) => r.option_int(keys::COMPONENT_INSTANCES, 0),
            None => Ok(0),
        }
    }

    pub fn to_json(&self) -> CorralResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CorralError::Internal(format!("Failed to serialize status: {}", e)))
    }

    pub fn from_json(json: &str) -> CorralResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CorralError::Rpc(format!("Unparseable status document: {}", e)))
    }

    /// Render the client properties as a Hadoop-style XML configuration.
    pub fn client_properties_xml(&self) -> String {
        let source = format!("instance {}", self.name);
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<configuration>\n");
        for (k, v) in &self.client_properties {
            let _ = writeln!(
                out,
                "  <property>\n    <name>{}</name>\n    <value>{}</value>\n    <source>{}</source>\n  </property>",
                xml_escape(k),
                xml_escape(v),
                xml_escape(&source)
            );
        }
        out.push_str("</configuration>\n");
        out
    }

    /// Render the client properties as a `key=value` properties file.
    pub fn client_properties_text(&self) -> String {
        let mut out = format!("# instance {}\n", self.name);
        for (k, v) in &self.client_properties {
            let _ = writeln!(out, "{}={}", properties_escape(k), properties_escape(v));
        }
        out
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn properties_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '=' | ':' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> AggregateConf {
        let mut conf = AggregateConf::new("demo");
        conf.internal_mut().set("shared", "internal");
        conf.internal_mut()
            .set(keys::INTERNAL_APPLICATION_TYPE, "generic");
        conf.resources_mut().set("shared", "resources");
        conf.resources_mut()
            .get_or_add_component("worker")
            .insert(keys::COMPONENT_INSTANCES.into(), "3".into());
        conf.app_conf_mut().set("shared", "app");
        conf.app_conf_mut().set("site.fs", "hdfs://nn");
        conf.app_conf_mut()
            .get_or_add_component("worker")
            .insert(keys::COMPONENT_INSTANCES.into(), "9".into());
        conf
    }

    #[test]
    fn test_from_aggregate_first_writer_wins() {
        let cd = ClusterDescription::from_aggregate(&definition()).unwrap();
        assert_eq!(cd.name, "demo");
        assert_eq!(cd.state, DescriptionState::Live);
        assert_eq!(cd.app_type, "generic");
        assert_eq!(cd.options.option("shared"), Some("internal"));
        assert_eq!(cd.options.option("site.fs"), Some("hdfs://nn"));
        assert_eq!(cd.desired_instances("worker").unwrap(), 3);
        assert_eq!(cd.desired_instances("absent").unwrap(), 0);
    }

    #[test]
    fn test_render_client_properties() {
        let mut cd = ClusterDescription {
            name: "demo".into(),
            ..Default::default()
        };
        cd.client_properties
            .insert("fs.default".into(), "hdfs://a<b>".into());

        let xml = cd.client_properties_xml();
        assert!(xml.contains("<name>fs.default</name>"));
        assert!(xml.contains("hdfs://a&lt;b&gt;"));

        let props = cd.client_properties_text();
        assert!(props.contains("fs.default=hdfs\\://a<b>"));
    }

    #[test]
    fn test_json_round_trip_uses_type_field() {
        let cd = ClusterDescription::from_aggregate(&definition()).unwrap();
        let json = cd.to_json().unwrap();
        assert!(json.contains("\"type\": \"generic\""));
        assert_eq!(ClusterDescription::from_json(&json).unwrap(), cd);
    }
}
