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

//! Instantiated plugins of one engine or context, in load order.

use std::collections::HashMap;
use std::sync::Arc;

use super::plugin::{YanPlugin, YanPluginDescriptor, YanPluginInstance, YanPluginKey, YanPluginRef};
use crate::errors::{Result, YanError};

#[derive(Clone)]
pub struct YanPluginEntry {
    pub descriptor: YanPluginDescriptor,
    pub instance: YanPluginInstance,
    /// Provided by the enclosing context rather than owned by the engine.
    pub from_context: bool,
}

impl YanPluginEntry {
    pub fn plugin(&self) -> &Arc<dyn YanPlugin> {
        self.instance.plugin()
    }
}

#[derive(Clone, Default)]
pub struct YanPluginCollection {
    entries: Vec<YanPluginEntry>,
    by_key: HashMap<YanPluginKey, usize>,
    by_name: HashMap<String, usize>,
}

impl YanPluginCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entry: YanPluginEntry) {
        if self.by_key.contains_key(&entry.descriptor.key()) {
            return;
        }
        let index = self.entries.len();
        self.by_key.insert(entry.descriptor.key(), index);
        if let Some(name) = entry.descriptor.name() {
            self.by_name.insert(name.to_string(), index);
        }
        self.entries.push(entry);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.by_key.clear();
        self.by_name.clear();
    }

    fn entry(&self, reference: &YanPluginRef) -> Option<&YanPluginEntry> {
        let index = match reference {
            YanPluginRef::Descriptor(descriptor) => self.by_key.get(&descriptor.key()),
            YanPluginRef::Name(name) => self.by_name.get(name),
        }?;
        self.entries.get(*index)
    }

    pub fn get(&self, reference: impl Into<YanPluginRef>) -> Option<Arc<dyn YanPlugin>> {
        self.entry(&reference.into()).map(|entry| entry.plugin().clone())
    }

    /// Like [`get`](Self::get) but fails with `PluginNotLoaded`.
    pub fn require(&self, reference: impl Into<YanPluginRef>) -> Result<Arc<dyn YanPlugin>> {
        let reference = reference.into();
        self.get(reference.clone()).ok_or_else(|| YanError::PluginNotLoaded {
            plugin: reference.label().to_string(),
        })
    }

    /// Look up an instance by its concrete type.
    pub fn get_as<P: YanPlugin>(&self) -> Option<Arc<P>> {
        let index = self.by_key.get(&YanPluginKey::Type(std::any::TypeId::of::<P>()))?;
        self.entries.get(*index)?.instance.downcast::<P>()
    }

    /// Look up an instance by name or handle and view it as `P`.
    pub fn get_ref_as<P: YanPlugin>(&self, reference: impl Into<YanPluginRef>) -> Option<Arc<P>> {
        self.entry(&reference.into())?.instance.downcast::<P>()
    }

    pub fn has(&self, reference: impl Into<YanPluginRef>) -> bool {
        self.entry(&reference.into()).is_some()
    }

    pub fn contains_key(&self, key: &YanPluginKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &YanPluginEntry> {
        self.entries.iter()
    }

    pub fn descriptors(&self) -> Vec<YanPluginDescriptor> {
        self.entries.iter().map(|entry| entry.descriptor.clone()).collect()
    }

    /// Labels in load order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.descriptor.label().to_string()).collect()
    }

    /// Entries owned by this collection's host, in load order.
    pub fn owned(&self) -> Vec<YanPluginEntry> {
        self.entries.iter().filter(|entry| !entry.from_context).cloned().collect()
    }
}
