//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Yan.
//! The Yan project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::collections::HashSet;

use proptest::prelude::*;

use yanx::{YanError, YanPluginDescriptor, YanPluginKey, YanPluginRef, YanPluginResolver};

fn plugin(name: &str, requires: &[&str]) -> YanPluginDescriptor {
    YanPluginDescriptor::named(name)
        .requires(requires.iter().copied())
        .build()
}

#[test]
fn test_dag_requirements_load_first() {
    let a = plugin("A", &[]);
    let b = plugin("B", &[]);
    let c = plugin("C", &["B"]);
    let d = plugin("D", &["C"]);

    let resolved = YanPluginResolver::new(vec![a.clone(), b, c, d])
        .requested(["A", "D"])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["A", "B", "C", "D"]);
}

#[test]
fn test_dag_builtins_are_roots_when_nothing_requested() {
    let typing = plugin("Typing", &[]);
    let undo = plugin("Undo", &[]);
    let clipboard = plugin("Clipboard", &["Typing"]);

    let resolved = YanPluginResolver::new(vec![clipboard, undo, typing])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["Typing", "Clipboard", "Undo"]);
}

#[test]
fn test_dag_requested_plugins_replace_builtins() {
    let a = plugin("A", &[]);
    let b = plugin("B", &[]);

    let resolved = YanPluginResolver::new(vec![a, b]).requested(["A"]).resolve().unwrap();

    assert_eq!(resolved.labels(), vec!["A"]);
}

#[test]
fn test_dag_extra_plugins_are_deduplicated() {
    let a = plugin("A", &[]);
    let b = plugin("B", &["A"]);

    let resolved = YanPluginResolver::new(vec![a, b.clone()])
        .extra([YanPluginRef::from("A"), YanPluginRef::from(&b)])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["A", "B"]);
}

#[test]
fn test_dag_requested_handle_outside_builtins() {
    let base = plugin("Base", &[]);
    let custom = YanPluginDescriptor::anonymous("CustomWidget").requires(["Base"]).build();

    let resolved = YanPluginResolver::new(vec![base])
        .requested([&custom])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["Base", "CustomWidget"]);
    assert!(resolved.contains(&custom.key()));
}

#[test]
fn test_dag_substitute_replaces_builtin_by_name() {
    let a = plugin("A", &["B"]);
    let b = plugin("B", &[]);
    let replacement = plugin("B", &[]);

    let resolved = YanPluginResolver::new(vec![a, b.clone()])
        .substitutes([replacement.clone()])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["B", "A"]);
    assert!(resolved.contains(&replacement.key()));
    assert!(!resolved.contains(&b.key()));
}

#[test]
fn test_dag_unnamed_substitute_is_rejected() {
    let a = plugin("A", &[]);
    let substitute = YanPluginDescriptor::anonymous("Nameless").build();

    let err = YanPluginResolver::new(vec![a])
        .substitutes([substitute])
        .resolve()
        .unwrap_err();

    assert!(matches!(err, YanError::InvalidSubstitute { .. }));
}

#[test]
fn test_dag_removal_by_name_and_handle() {
    let a = plugin("A", &[]);
    let b = plugin("B", &[]);
    let c = plugin("C", &[]);

    let resolved = YanPluginResolver::new(vec![a, b.clone(), c])
        .removed([YanPluginRef::from("A"), YanPluginRef::from(&b)])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["C"]);
    assert_eq!(resolved.removed().len(), 2);
}

#[test]
fn test_dag_removal_keeps_requirements_of_removed_plugin() {
    let a = plugin("A", &[]);
    let b = plugin("B", &[]);
    let c = plugin("C", &["B"]);
    let d = plugin("D", &["C"]);

    let resolved = YanPluginResolver::new(vec![a, b, c, d])
        .requested(["A", "D"])
        .removed(["D"])
        .resolve()
        .unwrap();

    assert_eq!(resolved.labels(), vec!["A", "B", "C"]);
    assert_eq!(resolved.removed().len(), 1);
    assert!(resolved.verify_requirements(&HashSet::new()).is_ok());
}

#[test]
fn test_dag_unknown_removal_is_ignored() {
    let a = plugin("A", &[]);

    let resolved = YanPluginResolver::new(vec![a]).removed(["Missing"]).resolve().unwrap();

    assert_eq!(resolved.labels(), vec!["A"]);
}

#[test]
fn test_dag_removing_required_plugin_fails_verification() {
    let a = plugin("A", &[]);
    let b = plugin("B", &["A"]);

    let resolved = YanPluginResolver::new(vec![a, b]).removed(["A"]).resolve().unwrap();
    assert_eq!(resolved.labels(), vec!["B"]);

    match resolved.verify_requirements(&HashSet::new()) {
        Err(YanError::PluginRequired { plugin, required_by }) => {
            assert_eq!(plugin, "A");
            assert_eq!(required_by, "B");
        }
        other => panic!("expected PluginRequired, got {other:?}"),
    }
}

#[test]
fn test_dag_provided_requirement_passes_verification() {
    let shared = plugin("Shared", &[]);
    let local = plugin("Local", &["Shared"]);

    let resolved = YanPluginResolver::new(vec![local])
        .provided([shared.clone()])
        .resolve()
        .unwrap();

    let provided: HashSet<YanPluginKey> = [shared.key()].into_iter().collect();
    assert!(resolved.verify_requirements(&provided).is_ok());
}

#[test]
fn test_dag_missing_plugins_are_all_reported() {
    let a = plugin("A", &["Ghost"]);

    let err = YanPluginResolver::new(vec![a])
        .requested(["A", "Phantom"])
        .resolve()
        .unwrap_err();

    match err {
        YanError::PluginNotFound { names } => assert_eq!(names, vec!["Ghost", "Phantom"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dag_name_conflict() {
    let first = plugin("Same", &[]);
    let second = plugin("Same", &[]);

    let err = YanPluginResolver::new(vec![first, second]).resolve().unwrap_err();

    assert_eq!(err, YanError::PluginNameConflict { name: "Same".to_string() });
}

#[test]
fn test_dag_self_requirement_is_a_cycle() {
    let a = plugin("A", &["A"]);

    let err = YanPluginResolver::new(vec![a]).resolve().unwrap_err();

    assert_eq!(
        err,
        YanError::CircularDependency {
            chain: vec!["A".to_string(), "A".to_string()]
        }
    );
}

#[test]
fn test_dag_cycle_through_three_plugins() {
    let a = plugin("A", &["B"]);
    let b = plugin("B", &["C"]);
    let c = plugin("C", &["A"]);

    let err = YanPluginResolver::new(vec![a, b, c]).resolve().unwrap_err();

    match err {
        YanError::CircularDependency { chain } => assert_eq!(chain, vec!["A", "B", "C", "A"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dag_requirements_are_recorded() {
    let a = plugin("A", &[]);
    let b = plugin("B", &["A"]);

    let resolved = YanPluginResolver::new(vec![a, b.clone()]).resolve().unwrap();

    let labels: Vec<&str> = resolved.requirements_of(&b).iter().map(|d| d.label()).collect();
    assert_eq!(labels, vec!["A"]);
}

proptest! {
    #[test]
    fn prop_dag_order_respects_requirements(
        edges in prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), 1..12),
        roots in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let mut descriptors: Vec<YanPluginDescriptor> = Vec::new();
        for (index, requires) in edges.iter().enumerate() {
            let names: Vec<String> = if index == 0 {
                Vec::new()
            } else {
                requires.iter().map(|pick| format!("P{}", pick.index(index))).collect()
            };
            descriptors.push(YanPluginDescriptor::named(format!("P{}", index)).requires(names).build());
        }

        let requested: Vec<String> = roots
            .iter()
            .map(|pick| format!("P{}", pick.index(descriptors.len())))
            .collect();

        let resolved = YanPluginResolver::new(descriptors.clone())
            .requested(requested)
            .resolve()
            .unwrap();

        let labels = resolved.labels();
        let unique: HashSet<&String> = labels.iter().collect();
        prop_assert_eq!(unique.len(), labels.len());

        for (position, descriptor) in resolved.iter().enumerate() {
            for requirement in descriptor.requires() {
                let required_at = labels.iter().position(|label| label == requirement.label());
                prop_assert!(matches!(required_at, Some(at) if at < position));
            }
        }
    }
}
