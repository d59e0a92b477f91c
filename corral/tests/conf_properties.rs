//! Property tests for configuration trees and component validation.
//!
//! Verifies:
//! - Merging defaults without overwrite is idempotent and never replaces values
//! - Resource requirements decode `max`, explicit values and defaults
//! - Duplicate component priorities are rejected naming both components

use std::collections::BTreeMap;

use corral::conf::{keys, ConfTree, OptionMap};
use corral::provider::{resource_requirement, validate_components, PriorityRule};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn option_map() -> impl Strategy<Value = OptionMap> {
    prop::collection::btree_map("[a-e]{1,2}", "[0-9a-z]{0,3}", 0..6)
}

fn conf_tree() -> impl Strategy<Value = ConfTree> {
    (
        option_map(),
        prop::collection::btree_map("[a-c]", option_map(), 0..4),
    )
        .prop_map(|(global, components)| ConfTree { global, components })
}

fn merged(target: &ConfTree, source: &ConfTree) -> ConfTree {
    let mut out = target.clone();
    out.merge_without_overwrite(source);
    out
}

proptest! {
    #[test]
    fn merge_without_overwrite_is_idempotent(a in conf_tree(), b in conf_tree()) {
        let once = merged(&a, &b);
        let twice = merged(&once, &b);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_without_overwrite_keeps_target_values(a in conf_tree(), b in conf_tree()) {
        let out = merged(&a, &b);
        for (k, v) in &a.global {
            prop_assert_eq!(out.global.get(k), Some(v));
        }
        for (name, opts) in &a.components {
            for (k, v) in opts {
                prop_assert_eq!(out.component(name).and_then(|c| c.get(k)), Some(v));
            }
        }
        for name in b.components.keys() {
            prop_assert!(out.component(name).is_some());
        }
    }
}

// =============================================================================
// Resource requirements
// =============================================================================

#[test]
fn test_resource_requirement_examples() {
    assert_eq!(resource_requirement(None, 512, 2048).unwrap(), 512);
    assert_eq!(resource_requirement(Some("max"), 512, 2048).unwrap(), 2048);
    assert_eq!(resource_requirement(Some("768"), 512, 2048).unwrap(), 768);
}

// =============================================================================
// Priorities
// =============================================================================

fn resources(priorities: &[(&str, &str)]) -> ConfTree {
    let mut tree = ConfTree::new();
    for (name, priority) in priorities {
        let component = tree.get_or_add_component(name);
        component.insert(keys::COMPONENT_INSTANCES.to_string(), "1".to_string());
        component.insert(keys::COMPONENT_PRIORITY.to_string(), priority.to_string());
    }
    tree
}

#[test]
fn test_duplicate_priorities_name_both_components() {
    let err = validate_components(&resources(&[("master", "5"), ("worker", "5")]), PriorityRule::Mandatory)
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("master") && text.contains("worker"), "{}", text);
}

#[test]
fn test_distinct_priorities_pass() {
    validate_components(&resources(&[("master", "5"), ("worker", "6")]), PriorityRule::Mandatory).unwrap();
}

#[test]
fn test_component_without_priority_rules() {
    let mut tree = ConfTree::new();
    tree.components.insert(
        "worker".to_string(),
        BTreeMap::from([(keys::COMPONENT_INSTANCES.to_string(), "2".to_string())]),
    );
    assert!(validate_components(&tree, PriorityRule::Optional).is_ok());
    assert!(validate_components(&tree, PriorityRule::Mandatory).is_err());
}
