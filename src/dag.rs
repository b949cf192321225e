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

//! # Plugin Dependency Graph
//!
//! Turns the plugin configuration of an engine (requested, built-in, extra,
//! removed and substitute plugins) into a deduplicated list of descriptors in
//! which every plugin comes after the plugins it requires.
//!
//! Expansion is depth-first with post-order emission, so ties keep the order
//! in which plugins were first seen. Removal is applied after expansion and
//! does not prune requirements of surviving plugins; those surface later as
//! [`YanError::PluginRequired`] via [`YanResolvedPlugins::verify_requirements`].

use std::collections::{HashMap, HashSet};

use crate::errors::{Result, YanError};
use crate::orbit::{YanPluginDescriptor, YanPluginKey, YanPluginRef, YanPluginRegistry};

#[derive(Clone, Debug, Default)]
pub struct YanPluginResolver {
    builtins: Vec<YanPluginDescriptor>,
    requested: Vec<YanPluginRef>,
    removed: Vec<YanPluginRef>,
    extra: Vec<YanPluginRef>,
    substitutes: Vec<YanPluginDescriptor>,
    provided: Vec<YanPluginDescriptor>,
}

impl YanPluginResolver {
    pub fn new(builtins: impl IntoIterator<Item = YanPluginDescriptor>) -> Self {
        YanPluginResolver {
            builtins: builtins.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Plugins to load. When empty, the built-ins are loaded instead.
    pub fn requested<I, R>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.requested.extend(plugins.into_iter().map(Into::into));
        self
    }

    pub fn removed<I, R>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.removed.extend(plugins.into_iter().map(Into::into));
        self
    }

    pub fn extra<I, R>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.extra.extend(plugins.into_iter().map(Into::into));
        self
    }

    pub fn substitutes(mut self, plugins: impl IntoIterator<Item = YanPluginDescriptor>) -> Self {
        self.substitutes.extend(plugins);
        self
    }

    /// Descriptors already instantiated elsewhere (context plugins). They
    /// take part in name lookup.
    pub fn provided(mut self, plugins: impl IntoIterator<Item = YanPluginDescriptor>) -> Self {
        self.provided.extend(plugins);
        self
    }

    pub fn resolve(&self) -> Result<YanResolvedPlugins> {
        let mut registry = YanPluginRegistry::new();
        for descriptor in self.builtins.iter().chain(&self.provided) {
            registry.register(descriptor)?;
        }
        for reference in self.requested.iter().chain(&self.extra).chain(&self.removed) {
            if let YanPluginRef::Descriptor(descriptor) = reference {
                registry.register(descriptor)?;
            }
        }

        let mut substitutions = HashMap::new();
        for substitute in &self.substitutes {
            registry.substitute(substitute)?;
            if let Some(name) = substitute.name() {
                substitutions.insert(name.to_string(), substitute.clone());
            }
        }

        let roots: Vec<YanPluginRef> = if self.requested.is_empty() {
            self.builtins.iter().map(YanPluginRef::from).collect()
        } else {
            self.requested.clone()
        };

        let mut walk = YanResolveWalk::new(&registry, &substitutions);
        for root in roots.iter().chain(&self.extra) {
            if let Some(descriptor) = walk.lookup(root) {
                walk.visit(descriptor)?;
            }
        }

        if !walk.missing.is_empty() {
            log::error!(
                "dag.plugins.missing: plugins could not be resolved - names={:?}",
                walk.missing
            );
            return Err(YanError::PluginNotFound { names: walk.missing });
        }

        let mut names: HashMap<&str, YanPluginKey> = HashMap::new();
        for descriptor in &walk.order {
            if let Some(name) = descriptor.name() {
                if let Some(key) = names.insert(name, descriptor.key()) {
                    if key != descriptor.key() {
                        return Err(YanError::PluginNameConflict { name: name.to_string() });
                    }
                }
            }
        }

        let mut removed_keys = HashSet::new();
        let mut removed_names = HashSet::new();
        for reference in &self.removed {
            match reference {
                YanPluginRef::Descriptor(descriptor) => {
                    removed_keys.insert(descriptor.key());
                    removed_keys.insert(walk.substitute(descriptor.clone()).key());
                }
                YanPluginRef::Name(name) => {
                    removed_names.insert(name.as_str());
                }
            }
        }

        for substitute in &self.substitutes {
            if !walk.used_substitutes.contains(&substitute.key()) {
                log::warn!(
                    "dag.plugins.substitute_unused: substitute matched no loaded plugin - plugin={}",
                    substitute.label()
                );
            }
        }

        let (plugins, removed): (Vec<_>, Vec<_>) = walk.order.into_iter().partition(|descriptor| {
            !removed_keys.contains(&descriptor.key())
                && !descriptor.name().map_or(false, |name| removed_names.contains(name))
        });

        log::debug!(
            "dag.plugins.resolved: plugin load order computed - count={}, removed={}, order={:?}",
            plugins.len(),
            removed.len(),
            plugins.iter().map(YanPluginDescriptor::label).collect::<Vec<_>>()
        );

        Ok(YanResolvedPlugins {
            plugins,
            removed,
            edges: walk.edges,
        })
    }
}

struct YanResolveWalk<'a> {
    registry: &'a YanPluginRegistry,
    substitutions: &'a HashMap<String, YanPluginDescriptor>,
    used_substitutes: HashSet<YanPluginKey>,
    missing: Vec<String>,
    stack: Vec<YanPluginDescriptor>,
    done: HashSet<YanPluginKey>,
    order: Vec<YanPluginDescriptor>,
    edges: HashMap<YanPluginKey, Vec<YanPluginDescriptor>>,
}

impl<'a> YanResolveWalk<'a> {
    fn new(registry: &'a YanPluginRegistry, substitutions: &'a HashMap<String, YanPluginDescriptor>) -> Self {
        YanResolveWalk {
            registry,
            substitutions,
            used_substitutes: HashSet::new(),
            missing: Vec::new(),
            stack: Vec::new(),
            done: HashSet::new(),
            order: Vec::new(),
            edges: HashMap::new(),
        }
    }

    fn lookup(&mut self, reference: &YanPluginRef) -> Option<YanPluginDescriptor> {
        match self.registry.lookup(reference) {
            Some(descriptor) => Some(self.substitute(descriptor)),
            None => {
                let name = reference.label().to_string();
                if !self.missing.contains(&name) {
                    self.missing.push(name);
                }
                None
            }
        }
    }

    fn substitute(&mut self, descriptor: YanPluginDescriptor) -> YanPluginDescriptor {
        let substitute = descriptor.name().and_then(|name| self.substitutions.get(name));
        match substitute {
            Some(substitute) => {
                self.used_substitutes.insert(substitute.key());
                substitute.clone()
            }
            None => descriptor,
        }
    }

    fn visit(&mut self, descriptor: YanPluginDescriptor) -> Result<()> {
        if self.done.contains(&descriptor.key()) {
            return Ok(());
        }

        if let Some(start) = self.stack.iter().position(|open| open.key() == descriptor.key()) {
            let mut chain: Vec<String> = self.stack[start..].iter().map(|open| open.label().to_string()).collect();
            chain.push(descriptor.label().to_string());
            log::error!("dag.plugins.cycle: circular plugin requirement - chain={:?}", chain);
            return Err(YanError::CircularDependency { chain });
        }

        self.stack.push(descriptor.clone());
        let mut requirements = Vec::new();
        for reference in descriptor.requires() {
            if let Some(requirement) = self.lookup(&reference) {
                self.visit(requirement.clone())?;
                requirements.push(requirement);
            }
        }
        self.stack.pop();

        self.done.insert(descriptor.key());
        self.edges.insert(descriptor.key(), requirements);
        self.order.push(descriptor);
        Ok(())
    }
}

/// Descriptors in load order, plus the requirement edges found on the way.
#[derive(Clone, Debug, Default)]
pub struct YanResolvedPlugins {
    plugins: Vec<YanPluginDescriptor>,
    removed: Vec<YanPluginDescriptor>,
    edges: HashMap<YanPluginKey, Vec<YanPluginDescriptor>>,
}

impl YanResolvedPlugins {
    pub fn descriptors(&self) -> &[YanPluginDescriptor] {
        &self.plugins
    }

    /// Plugins that were expanded but filtered out by removal.
    pub fn removed(&self) -> &[YanPluginDescriptor] {
        &self.removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &YanPluginDescriptor> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.plugins.iter().map(|descriptor| descriptor.label().to_string()).collect()
    }

    pub fn contains(&self, key: &YanPluginKey) -> bool {
        self.plugins.iter().any(|descriptor| descriptor.key() == *key)
    }

    /// Resolved requirements of `descriptor`, after substitution.
    pub fn requirements_of(&self, descriptor: &YanPluginDescriptor) -> &[YanPluginDescriptor] {
        self.edges.get(&descriptor.key()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check that every requirement of a loaded plugin is either loaded or in
    /// `provided`, and that context plugins only require context plugins.
    pub fn verify_requirements(&self, provided: &HashSet<YanPluginKey>) -> Result<()> {
        let loaded: HashSet<YanPluginKey> = self.plugins.iter().map(YanPluginDescriptor::key).collect();

        for descriptor in &self.plugins {
            for requirement in self.requirements_of(descriptor) {
                if !loaded.contains(&requirement.key()) && !provided.contains(&requirement.key()) {
                    return Err(YanError::PluginRequired {
                        plugin: requirement.label().to_string(),
                        required_by: descriptor.label().to_string(),
                    });
                }
                if descriptor.is_context_plugin() && !requirement.is_context_plugin() {
                    return Err(YanError::ContextPluginRequired {
                        plugin: requirement.label().to_string(),
                        required_by: descriptor.label().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
