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

use serde_json::json;

use yanx::{YanError, YanLockId, YanLockRegistry, YanSymbol};

#[test]
fn test_lock_registry_gate_follows_lock_count() {
    let mut registry = YanLockRegistry::new();
    assert!(!registry.is_engaged());

    assert!(registry.enable("comments").unwrap());
    assert!(registry.is_engaged());
    assert!(!registry.enable("track-changes").unwrap());
    assert_eq!(registry.len(), 2);

    assert!(!registry.disable("comments").unwrap());
    assert!(registry.is_engaged());
    assert!(registry.disable("track-changes").unwrap());
    assert!(!registry.is_engaged());
}

#[test]
fn test_lock_registry_enable_is_idempotent() {
    let mut registry = YanLockRegistry::new();
    assert!(registry.enable("a").unwrap());
    assert!(!registry.enable("a").unwrap());
    assert_eq!(registry.len(), 1);

    assert!(registry.disable("a").unwrap());
    assert!(!registry.disable("a").unwrap());
    assert!(registry.is_empty());
}

#[test]
fn test_lock_registry_disable_unknown_lock_is_noop() {
    let mut registry = YanLockRegistry::new();
    registry.enable("a").unwrap();
    assert!(!registry.disable("b").unwrap());
    assert!(registry.contains(&YanLockId::from("a")));
}

#[test]
fn test_symbol_locks_are_independent_of_names() {
    let mut registry = YanLockRegistry::new();
    let symbol = YanSymbol::new("a");

    registry.enable(&symbol).unwrap();
    registry.enable("a").unwrap();
    assert_eq!(registry.len(), 2);

    registry.disable("a").unwrap();
    assert!(registry.is_engaged());
    registry.disable(symbol).unwrap();
    assert!(!registry.is_engaged());
}

#[test]
fn test_lock_id_from_value_rejects_non_strings() {
    for value in [json!(1), json!(null), json!(true), json!({"id": "a"}), json!(["a"])] {
        match YanLockId::from_value(&value) {
            Err(YanError::InvalidLockId { .. }) => {}
            other => panic!("expected InvalidLockId for {value}, got {other:?}"),
        }
    }

    assert_eq!(YanLockId::from_value(&json!("a")).unwrap(), YanLockId::from("a"));
}

#[test]
fn test_empty_lock_name_is_rejected() {
    let mut registry = YanLockRegistry::new();
    assert!(matches!(registry.enable(""), Err(YanError::InvalidLockId { .. })));
    assert!(matches!(registry.disable("  "), Err(YanError::InvalidLockId { .. })));
    assert!(!registry.is_engaged());
}

#[test]
fn test_subscribers_observe_gate_transitions() {
    let mut registry = YanLockRegistry::new();
    let mut gate = registry.subscribe();
    assert!(!*gate.borrow_and_update());

    registry.enable("a").unwrap();
    assert!(gate.has_changed().unwrap());
    assert!(*gate.borrow_and_update());

    registry.enable("b").unwrap();
    assert!(!gate.has_changed().unwrap());

    registry.disable("a").unwrap();
    registry.disable("b").unwrap();
    assert!(gate.has_changed().unwrap());
    assert!(!*gate.borrow_and_update());
}
