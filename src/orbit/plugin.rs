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

//! Yan Plugin Interface - descriptors, references and instance hooks.
//!
//! A plugin is declared once, as a [`YanPluginDescriptor`], and instantiated
//! once per engine (or once per context for context plugins). Statically
//! typed plugins implement [`YanPluginClass`] and are described with
//! [`YanPluginDescriptor::of`]; descriptors can also be assembled at runtime
//! with [`YanPluginDescriptor::named`].
//!
//! # Example
//!
//! ```ignore
//! use yanx::orbit::{YanPlugin, YanPluginClass, YanPluginHost, YanPluginRef};
//!
//! struct Clipboard;
//!
//! #[async_trait::async_trait]
//! impl YanPlugin for Clipboard {}
//!
//! impl YanPluginClass for Clipboard {
//!     const PLUGIN_NAME: Option<&'static str> = Some("Clipboard");
//!
//!     fn requires() -> Vec<YanPluginRef> {
//!         vec!["Typing".into()]
//!     }
//!
//!     fn create(_host: &YanPluginHost) -> yanx::Result<Self> {
//!         Ok(Clipboard)
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{YanContext, YanWeakContext};
use crate::engine::{YanEngine, YanWeakEngine};
use crate::errors::Result;

static NEXT_DYNAMIC_KEY: AtomicU64 = AtomicU64::new(1);

/// Lifecycle hooks of a plugin instance. Every hook is optional.
#[async_trait]
pub trait YanPlugin: Send + Sync + 'static {
    /// First phase: runs for every plugin, in load order.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Second phase: runs after every plugin finished `init`.
    async fn after_init(&self) -> Result<()> {
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        Ok(())
    }
}

/// Static declaration of a plugin type.
pub trait YanPluginClass: YanPlugin + Sized {
    const PLUGIN_NAME: Option<&'static str> = None;
    const IS_CONTEXT_PLUGIN: bool = false;

    fn requires() -> Vec<YanPluginRef> {
        Vec::new()
    }

    fn create(host: &YanPluginHost) -> Result<Self>;
}

/// What a plugin factory is given: a weak handle to the engine or context
/// that owns the new instance.
#[derive(Clone)]
pub enum YanPluginHost {
    Engine(YanWeakEngine),
    Context(YanWeakContext),
}

impl YanPluginHost {
    pub fn engine(&self) -> Option<YanEngine> {
        match self {
            YanPluginHost::Engine(engine) => engine.upgrade(),
            YanPluginHost::Context(_) => None,
        }
    }

    pub fn context(&self) -> Option<YanContext> {
        match self {
            YanPluginHost::Engine(engine) => engine.upgrade().map(|engine| engine.context()),
            YanPluginHost::Context(context) => context.upgrade(),
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self, YanPluginHost::Context(_))
    }
}

/// Identity of a plugin descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum YanPluginKey {
    Type(TypeId),
    Dynamic(u64),
}

/// A constructed plugin, viewed both as hooks and as its concrete type.
#[derive(Clone)]
pub struct YanPluginInstance {
    pub(crate) plugin: Arc<dyn YanPlugin>,
    pub(crate) any: Arc<dyn Any + Send + Sync>,
}

impl YanPluginInstance {
    pub fn new<P: YanPlugin>(plugin: P) -> Self {
        let plugin = Arc::new(plugin);
        YanPluginInstance {
            plugin: plugin.clone(),
            any: plugin,
        }
    }

    pub fn plugin(&self) -> &Arc<dyn YanPlugin> {
        &self.plugin
    }

    pub fn downcast<P: YanPlugin>(&self) -> Option<Arc<P>> {
        self.any.clone().downcast::<P>().ok()
    }
}

type YanPluginFactory = Arc<dyn Fn(&YanPluginHost) -> Result<YanPluginInstance> + Send + Sync>;

#[derive(Clone)]
enum YanRequires {
    Static(fn() -> Vec<YanPluginRef>),
    Listed(Vec<YanPluginRef>),
}

struct YanPluginDescriptorInner {
    key: YanPluginKey,
    label: String,
    name: Option<String>,
    requires: YanRequires,
    is_context_plugin: bool,
    factory: YanPluginFactory,
}

#[derive(Clone)]
pub struct YanPluginDescriptor {
    inner: Arc<YanPluginDescriptorInner>,
}

impl YanPluginDescriptor {
    pub fn of<P: YanPluginClass>() -> Self {
        let label = P::PLUGIN_NAME
            .map(str::to_string)
            .unwrap_or_else(|| short_type_name(std::any::type_name::<P>()));
        YanPluginDescriptor {
            inner: Arc::new(YanPluginDescriptorInner {
                key: YanPluginKey::Type(TypeId::of::<P>()),
                label,
                name: P::PLUGIN_NAME.map(str::to_string),
                requires: YanRequires::Static(P::requires),
                is_context_plugin: P::IS_CONTEXT_PLUGIN,
                factory: Arc::new(|host: &YanPluginHost| -> Result<YanPluginInstance> {
                    Ok(YanPluginInstance::new(P::create(host)?))
                }),
            }),
        }
    }

    /// Start a runtime-built descriptor that declares `name`.
    pub fn named(name: impl Into<String>) -> YanPluginDescriptorBuilder {
        let name = name.into();
        YanPluginDescriptorBuilder::new(name.clone(), Some(name))
    }

    /// Start a runtime-built descriptor without a declared name. It can only
    /// be referenced by handle.
    pub fn anonymous(label: impl Into<String>) -> YanPluginDescriptorBuilder {
        YanPluginDescriptorBuilder::new(label.into(), None)
    }

    pub fn key(&self) -> YanPluginKey {
        self.inner.key
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Declared name, or the type name for unnamed plugins.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn requires(&self) -> Vec<YanPluginRef> {
        match &self.inner.requires {
            YanRequires::Static(requires) => requires(),
            YanRequires::Listed(requires) => requires.clone(),
        }
    }

    pub fn is_context_plugin(&self) -> bool {
        self.inner.is_context_plugin
    }

    pub fn instantiate(&self, host: &YanPluginHost) -> Result<YanPluginInstance> {
        (self.inner.factory)(host)
    }
}

impl PartialEq for YanPluginDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for YanPluginDescriptor {}

impl Hash for YanPluginDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for YanPluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YanPluginDescriptor")
            .field("label", &self.inner.label)
            .field("key", &self.inner.key)
            .field("is_context_plugin", &self.inner.is_context_plugin)
            .finish()
    }
}

impl fmt::Display for YanPluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct YanPluginDescriptorBuilder {
    label: String,
    name: Option<String>,
    requires: Vec<YanPluginRef>,
    is_context_plugin: bool,
    factory: Option<YanPluginFactory>,
}

impl YanPluginDescriptorBuilder {
    fn new(label: String, name: Option<String>) -> Self {
        YanPluginDescriptorBuilder {
            label,
            name,
            requires: Vec::new(),
            is_context_plugin: false,
            factory: None,
        }
    }

    pub fn requires<I, R>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.requires.extend(requires.into_iter().map(Into::into));
        self
    }

    pub fn context_plugin(mut self, is_context_plugin: bool) -> Self {
        self.is_context_plugin = is_context_plugin;
        self
    }

    pub fn factory<P, F>(mut self, factory: F) -> Self
    where
        P: YanPlugin,
        F: Fn(&YanPluginHost) -> Result<P> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move |host: &YanPluginHost| -> Result<YanPluginInstance> {
            Ok(YanPluginInstance::new(factory(host)?))
        }));
        self
    }

    pub fn build(self) -> YanPluginDescriptor {
        let factory: YanPluginFactory = match self.factory {
            Some(factory) => factory,
            None => Arc::new(|_: &YanPluginHost| -> Result<YanPluginInstance> {
                Ok(YanPluginInstance::new(YanInertPlugin))
            }),
        };
        YanPluginDescriptor {
            inner: Arc::new(YanPluginDescriptorInner {
                key: YanPluginKey::Dynamic(NEXT_DYNAMIC_KEY.fetch_add(1, Ordering::Relaxed)),
                label: self.label,
                name: self.name,
                requires: YanRequires::Listed(self.requires),
                is_context_plugin: self.is_context_plugin,
                factory,
            }),
        }
    }
}

/// Plugin without hooks, used by descriptors built without a factory.
#[derive(Debug, Default)]
pub struct YanInertPlugin;

#[async_trait]
impl YanPlugin for YanInertPlugin {}

/// Reference to a plugin, either by handle or by declared name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum YanPluginRef {
    Descriptor(YanPluginDescriptor),
    Name(String),
}

impl YanPluginRef {
    pub fn of<P: YanPluginClass>() -> Self {
        YanPluginRef::Descriptor(YanPluginDescriptor::of::<P>())
    }

    pub fn label(&self) -> &str {
        match self {
            YanPluginRef::Descriptor(descriptor) => descriptor.label(),
            YanPluginRef::Name(name) => name,
        }
    }
}

impl fmt::Display for YanPluginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for YanPluginRef {
    fn from(name: &str) -> Self {
        YanPluginRef::Name(name.to_string())
    }
}

impl From<String> for YanPluginRef {
    fn from(name: String) -> Self {
        YanPluginRef::Name(name)
    }
}

impl From<YanPluginDescriptor> for YanPluginRef {
    fn from(descriptor: YanPluginDescriptor) -> Self {
        YanPluginRef::Descriptor(descriptor)
    }
}

impl From<&YanPluginDescriptor> for YanPluginRef {
    fn from(descriptor: &YanPluginDescriptor) -> Self {
        YanPluginRef::Descriptor(descriptor.clone())
    }
}

fn short_type_name(full: &str) -> String {
    full.rsplit("::").next().unwrap_or(full).to_string()
}
