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

//! Engine events and a minimal synchronous emitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::license::YanLicenseVerdict;
use crate::sync::guard;

#[derive(Clone, Debug, PartialEq)]
pub struct YanPropertyChange {
    pub property: String,
    pub value: Value,
    pub old_value: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum YanEngineEvent {
    Ready,
    Destroy,
    Change(YanPropertyChange),
    LicenseBlocked(YanLicenseVerdict),
    LicenseWarning(String),
}

impl YanEngineEvent {
    pub fn name(&self) -> String {
        match self {
            YanEngineEvent::Ready => "ready".to_string(),
            YanEngineEvent::Destroy => "destroy".to_string(),
            YanEngineEvent::Change(change) => format!("change:{}", change.property),
            YanEngineEvent::LicenseBlocked(_) => "license:blocked".to_string(),
            YanEngineEvent::LicenseWarning(_) => "license:warning".to_string(),
        }
    }

    pub fn as_change(&self, property: &str) -> Option<&YanPropertyChange> {
        match self {
            YanEngineEvent::Change(change) if change.property == property => Some(change),
            _ => None,
        }
    }
}

pub type YanListenerId = u64;

type YanListener = Arc<dyn Fn(&YanEngineEvent) + Send + Sync>;

/// Listeners are invoked outside the internal lock, so they may register or
/// remove listeners and call back into the engine.
#[derive(Default)]
pub struct YanEmitter {
    listeners: Mutex<Vec<(YanListenerId, YanListener)>>,
    next_id: AtomicU64,
}

impl YanEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, listener: F) -> YanListenerId
    where
        F: Fn(&YanEngineEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        guard(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    pub fn off(&self, id: YanListenerId) -> bool {
        let mut listeners = guard(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &YanEngineEvent) {
        let listeners: Vec<YanListener> = guard(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn clear(&self) {
        guard(&self.listeners).clear();
    }

    pub fn len(&self) -> usize {
        guard(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        guard(&self.listeners).is_empty()
    }
}
