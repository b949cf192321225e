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

//! # Lock Registry Module
//!
//! A reference-counted boolean gate. Any number of independent parties may
//! hold a lock under their own identifier; the gate is engaged while at least
//! one lock is held. The engine uses one registry to back read-only mode.
//!
//! Identifiers are either non-empty names or [`YanSymbol`]s. Symbols are
//! process-unique, so two symbols with the same description never collide.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::watch;

use crate::errors::{Result, YanError};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);
static LICENSE_LOCK: OnceLock<YanSymbol> = OnceLock::new();

/// Reserved lock used by the license validator. Nothing else may hold it.
pub(crate) fn license_lock_id() -> YanLockId {
    YanLockId::Symbol(LICENSE_LOCK.get_or_init(|| YanSymbol::new("license")).clone())
}

/// A unique, opaque token usable as a lock identifier.
#[derive(Clone, Debug)]
pub struct YanSymbol {
    id: u64,
    description: Arc<str>,
}

impl YanSymbol {
    pub fn new(description: impl Into<String>) -> Self {
        YanSymbol {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: Arc::from(description.into()),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for YanSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for YanSymbol {}

impl std::hash::Hash for YanSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for YanSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Identifier of a single lock held in a [`YanLockRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum YanLockId {
    Name(String),
    Symbol(YanSymbol),
}

impl YanLockId {
    /// Validate an identifier received as dynamic JSON input. Only non-empty
    /// strings are accepted; numbers, null and structured values are rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => {
                let id = YanLockId::Name(name.clone());
                id.validate()?;
                Ok(id)
            }
            other => Err(YanError::invalid_lock_id(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            YanLockId::Name(name) if name.trim().is_empty() => {
                Err(YanError::invalid_lock_id(format!("{:?}", name)))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for YanLockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YanLockId::Name(name) => write!(f, "{}", name),
            YanLockId::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

impl From<&str> for YanLockId {
    fn from(s: &str) -> Self {
        YanLockId::Name(s.to_string())
    }
}

impl From<String> for YanLockId {
    fn from(s: String) -> Self {
        YanLockId::Name(s)
    }
}

impl From<YanSymbol> for YanLockId {
    fn from(symbol: YanSymbol) -> Self {
        YanLockId::Symbol(symbol)
    }
}

impl From<&YanSymbol> for YanLockId {
    fn from(symbol: &YanSymbol) -> Self {
        YanLockId::Symbol(symbol.clone())
    }
}

/// Set of active locks plus the derived gate.
///
/// `enable` and `disable` return `true` when the call flipped the gate, which
/// lets the owner fire exactly one change notification per transition.
/// Subscribers obtained via [`YanLockRegistry::subscribe`] observe the same
/// transitions.
#[derive(Debug)]
pub struct YanLockRegistry {
    locks: HashSet<YanLockId>,
    gate: watch::Sender<bool>,
}

impl Default for YanLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl YanLockRegistry {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        YanLockRegistry {
            locks: HashSet::new(),
            gate,
        }
    }

    pub fn enable(&mut self, lock_id: impl Into<YanLockId>) -> Result<bool> {
        let lock_id = lock_id.into();
        lock_id.validate()?;
        self.locks.insert(lock_id);
        Ok(self.publish())
    }

    pub fn disable(&mut self, lock_id: impl Into<YanLockId>) -> Result<bool> {
        let lock_id = lock_id.into();
        lock_id.validate()?;
        self.locks.remove(&lock_id);
        Ok(self.publish())
    }

    pub fn is_engaged(&self) -> bool {
        !self.locks.is_empty()
    }

    pub fn contains(&self, lock_id: &YanLockId) -> bool {
        self.locks.contains(lock_id)
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn lock_ids(&self) -> Vec<YanLockId> {
        self.locks.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    fn publish(&self) -> bool {
        let engaged = self.is_engaged();
        self.gate.send_if_modified(|current| {
            if *current == engaged {
                false
            } else {
                *current = engaged;
                true
            }
        })
    }
}
