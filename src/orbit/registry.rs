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

//! Name and identity lookup for plugin descriptors.

use std::collections::HashMap;

use super::plugin::{YanPluginDescriptor, YanPluginKey, YanPluginRef};
use crate::errors::{Result, YanError};

/// Two maps kept in sync: declared name to descriptor and key to descriptor.
#[derive(Clone, Debug, Default)]
pub struct YanPluginRegistry {
    by_name: HashMap<String, YanPluginDescriptor>,
    by_key: HashMap<YanPluginKey, YanPluginDescriptor>,
}

impl YanPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Registering the same descriptor twice is a
    /// no-op; a different descriptor reusing a registered name is a conflict.
    pub fn register(&mut self, descriptor: &YanPluginDescriptor) -> Result<()> {
        if let Some(name) = descriptor.name() {
            if let Some(existing) = self.by_name.get(name) {
                if existing.key() != descriptor.key() {
                    return Err(YanError::PluginNameConflict { name: name.to_string() });
                }
            }
            self.by_name.insert(name.to_string(), descriptor.clone());
        }
        self.by_key.insert(descriptor.key(), descriptor.clone());
        Ok(())
    }

    /// Register `descriptor` as the owner of its name, replacing whatever
    /// held the name before. Returns the replaced descriptor.
    pub fn substitute(&mut self, descriptor: &YanPluginDescriptor) -> Result<Option<YanPluginDescriptor>> {
        let name = descriptor.name().ok_or_else(|| YanError::InvalidSubstitute {
            plugin: descriptor.label().to_string(),
            reason: "substitute plugins must declare a name".to_string(),
        })?;
        self.by_key.insert(descriptor.key(), descriptor.clone());
        Ok(self
            .by_name
            .insert(name.to_string(), descriptor.clone())
            .filter(|replaced| replaced.key() != descriptor.key()))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&YanPluginDescriptor> {
        self.by_name.get(name)
    }

    pub fn get_by_key(&self, key: &YanPluginKey) -> Option<&YanPluginDescriptor> {
        self.by_key.get(key)
    }

    pub fn lookup(&self, reference: &YanPluginRef) -> Option<YanPluginDescriptor> {
        match reference {
            YanPluginRef::Descriptor(descriptor) => Some(descriptor.clone()),
            YanPluginRef::Name(name) => self.by_name.get(name).cloned(),
        }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
