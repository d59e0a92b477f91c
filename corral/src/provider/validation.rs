//! Component count, priority and resource checks.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::ResourceLimits;
use super::utils::resource_requirement;
use crate::conf::{keys, ConfTree, OptionMapExt};
use crate::error::{CorralError, CorralResult};

/// Whether a component must declare a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityRule {
    /// Absence is an error.
    Mandatory,
    /// Checked only when present.
    Optional,
}

/// Validate every component in the resources tree except the coordinator.
///
/// Each must declare a non-negative `component.instances`. Priorities must be
/// positive integers and unique across components; a duplicate names both
/// components involved.
pub fn validate_components(resources: &ConfTree, priorities: PriorityRule) -> CorralResult<()> {
    let mut seen: BTreeMap<i64, &str> = BTreeMap::new();

    for (name, component) in resources
        .components
        .iter()
        .filter(|(name, _)| name.as_str() != keys::COMPONENT_COORDINATOR)
    {
        if component.option(keys::COMPONENT_INSTANCES).is_none() {
            return Err(CorralError::bad_config(format!(
                "Component {} does not declare {}",
                name,
                keys::COMPONENT_INSTANCES
            )));
        }
        let count = component.mandatory_option_int(keys::COMPONENT_INSTANCES)?;
        if count < 0 {
            return Err(CorralError::bad_config(format!(
                "Component {} {} value out of range {}",
                name,
                keys::COMPONENT_INSTANCES,
                count
            )));
        }

        let priority = match (component.option(keys::COMPONENT_PRIORITY), priorities) {
            (None, PriorityRule::Optional) => continue,
            (None, PriorityRule::Mandatory) => {
                return Err(CorralError::bad_config(format!(
                    "Component {} does not declare {}",
                    name,
                    keys::COMPONENT_PRIORITY
                )))
            }
            (Some(_), _) => component.mandatory_option_int(keys::COMPONENT_PRIORITY)?,
        };
        if priority <= 0 {
            return Err(CorralError::bad_config(format!(
                "Component {} {} value out of range {}",
                name,
                keys::COMPONENT_PRIORITY,
                priority
            )));
        }
        if let Some(existing) = seen.insert(priority, name) {
            return Err(CorralError::bad_config(format!(
                "Component {} has a {} value {} which duplicates that of {}",
                name,
                keys::COMPONENT_PRIORITY,
                priority,
                existing
            )));
        }
        debug!(component = %name, count, priority, "Component validated");
    }
    Ok(())
}

/// Check that every component's memory and core requirements parse.
///
/// Explicit values above the platform ceiling are rejected.
pub fn validate_resource_requirements(
    resources: &ConfTree,
    limits: &ResourceLimits,
) -> CorralResult<()> {
    for (name, component) in &resources.components {
        let memory = resource_requirement(
            component
                .option(keys::RESOURCE_MEMORY)
                .or_else(|| resources.get(keys::RESOURCE_MEMORY)),
            keys::DEFAULT_MEMORY,
            limits.max_memory,
        )?;
        let cores = resource_requirement(
            component
                .option(keys::RESOURCE_CORES)
                .or_else(|| resources.get(keys::RESOURCE_CORES)),
            keys::DEFAULT_CORES,
            limits.max_cores,
        )?;
        limits.check(name, memory, cores)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(tree: &mut ConfTree, name: &str, pairs: &[(&str, &str)]) {
        let c = tree.get_or_add_component(name);
        for (k, v) in pairs {
            c.insert(k.to_string(), v.to_string());
        }
    }

    #[test]
    fn test_missing_count_names_component() {
        let mut resources = ConfTree::new();
        component(&mut resources, "worker", &[(keys::COMPONENT_PRIORITY, "1")]);
        let err = validate_components(&resources, PriorityRule::Mandatory).unwrap_err();
        assert!(err.to_string().contains("worker"));
        assert!(err.to_string().contains(keys::COMPONENT_INSTANCES));
    }

    #[test]
    fn test_coordinator_is_exempt() {
        let mut resources = ConfTree::new();
        component(&mut resources, keys::COMPONENT_COORDINATOR, &[]);
        assert!(validate_components(&resources, PriorityRule::Mandatory).is_ok());
    }

    #[test]
    fn test_duplicate_priorities_name_both_components() {
        let mut resources = ConfTree::new();
        component(
            &mut resources,
            "master",
            &[(keys::COMPONENT_INSTANCES, "1"), (keys::COMPONENT_PRIORITY, "1")],
        );
        component(
            &mut resources,
            "worker",
            &[(keys::COMPONENT_INSTANCES, "2"), (keys::COMPONENT_PRIORITY, "1")],
        );
        let err = validate_components(&resources, PriorityRule::Mandatory).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("master"));
        assert!(text.contains("worker"));
    }

    #[test]
    fn test_priority_must_be_positive() {
        let mut resources = ConfTree::new();
        component(
            &mut resources,
            "worker",
            &[(keys::COMPONENT_INSTANCES, "1"), (keys::COMPONENT_PRIORITY, "0")],
        );
        assert!(validate_components(&resources, PriorityRule::Optional).is_err());
    }

    #[test]
    fn test_optional_priority_may_be_absent() {
        let mut resources = ConfTree::new();
        component(&mut resources, "worker", &[(keys::COMPONENT_INSTANCES, "1")]);
        assert!(validate_components(&resources, PriorityRule::Optional).is_ok());
        assert!(validate_components(&resources, PriorityRule::Mandatory).is_err());
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut resources = ConfTree::new();
        component(&mut resources, "worker", &[(keys::COMPONENT_INSTANCES, "-1")]);
        assert!(validate_components(&resources, PriorityRule::Optional).is_err());
    }

    #[test]
    fn test_resource_requirements() {
        let limits = ResourceLimits {
            max_memory: 4096,
            max_cores: 4,
        };
        let mut resources = ConfTree::new();
        component(&mut resources, "worker", &[(keys::RESOURCE_MEMORY, "max")]);
        assert!(validate_resource_requirements(&resources, &limits).is_ok());

        component(&mut resources, "worker", &[(keys::RESOURCE_MEMORY, "8192")]);
        assert!(validate_resource_requirements(&resources, &limits).is_err());

        component(&mut resources, "worker", &[(keys::RESOURCE_MEMORY, "lots")]);
        let err = validate_resource_requirements(&resources, &limits).unwrap_err();
        assert!(err.to_string().contains("lots"));
    }
}
