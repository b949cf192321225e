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

//! # Context Module
//!
//! A [`YanContext`] is the enclosing host of one or more engines. It owns the
//! shared configuration, the locale and the context plugins, which every
//! engine attached to it sees in its own plugin collection.
//!
//! An engine built without a context creates a private one. A private context
//! belongs to that engine alone and is destroyed together with it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures::future::{join_all, BoxFuture, FutureExt};

use crate::config::{YanConfig, YanEngineConfig};
use crate::dag::YanPluginResolver;
use crate::engine::{YanEngine, YanWeakEngine};
use crate::errors::{Result, YanError};
use crate::lifecycle::{destroy_plugins, run_phase, YanPluginPhase};
use crate::locale::{YanLocale, DEFAULT_LANGUAGE};
use crate::orbit::{YanPluginCollection, YanPluginEntry, YanPluginHost};
use crate::sync::guard;

struct YanContextInner {
    config: YanConfig,
    locale: YanLocale,
    plugins: Mutex<YanPluginCollection>,
    owner: Option<u64>,
    engines: Mutex<Vec<(u64, YanWeakEngine)>>,
    destroyed: AtomicBool,
}

#[derive(Clone)]
pub struct YanContext {
    inner: Arc<YanContextInner>,
}

#[derive(Clone)]
pub struct YanWeakContext(Weak<YanContextInner>);

impl YanWeakContext {
    pub fn upgrade(&self) -> Option<YanContext> {
        self.0.upgrade().map(|inner| YanContext { inner })
    }
}

impl YanContext {
    /// Build a context from `config` and initialise its plugins. Only
    /// `plugins`, `extra_plugins`, `remove_plugins`, `substitute_plugins`,
    /// `language`, `translations` and `options` are read.
    pub async fn create(config: YanEngineConfig) -> Result<YanContext> {
        let context = Self::build(&config, None);
        context.init_plugins(&config).await?;
        Ok(context)
    }

    /// Context created on behalf of the engine `owner`.
    pub(crate) fn private(config: &YanEngineConfig, owner: u64) -> YanContext {
        Self::build(config, Some(owner))
    }

    fn build(config: &YanEngineConfig, owner: Option<u64>) -> YanContext {
        let language = config.language.as_ref();
        let ui_language = language.and_then(|language| language.ui()).unwrap_or(DEFAULT_LANGUAGE);
        let content_language = language.and_then(|language| language.content());
        let locale = YanLocale::new(ui_language, content_language, config.translations.clone());

        let mut visible = config.visible_options();
        visible.remove("licenseKey");

        YanContext {
            inner: Arc::new(YanContextInner {
                config: visible,
                locale,
                plugins: Mutex::new(YanPluginCollection::new()),
                owner,
                engines: Mutex::new(Vec::new()),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    async fn init_plugins(&self, config: &YanEngineConfig) -> Result<()> {
        let resolved = YanPluginResolver::new(Vec::new())
            .requested(config.plugins.clone())
            .extra(config.extra_plugins.clone())
            .removed(config.remove_plugins.clone())
            .substitutes(config.substitute_plugins.clone())
            .resolve()?;

        if let Some(plugin) = resolved.iter().find(|descriptor| !descriptor.is_context_plugin()) {
            return Err(YanError::ContextPluginRequired {
                plugin: plugin.label().to_string(),
                required_by: "context".to_string(),
            });
        }
        resolved.verify_requirements(&HashSet::new())?;

        let host = YanPluginHost::Context(self.downgrade());
        let mut entries = Vec::with_capacity(resolved.len());
        for descriptor in resolved.iter() {
            let instance = descriptor.instantiate(&host)?;
            entries.push(YanPluginEntry {
                descriptor: descriptor.clone(),
                instance,
                from_context: false,
            });
        }

        {
            let mut plugins = guard(&self.inner.plugins);
            for entry in &entries {
                plugins.insert(entry.clone());
            }
        }

        run_phase(YanPluginPhase::Init, &entries).await?;
        run_phase(YanPluginPhase::AfterInit, &entries).await?;

        log::info!(
            "context.plugins.ready: context plugins initialised - count={}",
            entries.len()
        );
        Ok(())
    }

    pub fn downgrade(&self) -> YanWeakContext {
        YanWeakContext(Arc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &YanConfig {
        &self.inner.config
    }

    pub fn locale(&self) -> &YanLocale {
        &self.inner.locale
    }

    pub fn plugins(&self) -> YanPluginCollection {
        guard(&self.inner.plugins).clone()
    }

    pub fn is_private(&self) -> bool {
        self.inner.owner.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    pub fn engine_count(&self) -> usize {
        guard(&self.inner.engines).len()
    }

    pub fn ptr_eq(&self, other: &YanContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Attach an engine. A private context only accepts its owner.
    pub(crate) fn add_engine(&self, engine: &YanEngine) -> Result<()> {
        if let Some(owner) = self.inner.owner {
            if owner != engine.id() {
                return Err(YanError::PrivateContext);
            }
        }
        guard(&self.inner.engines).push((engine.id(), engine.downgrade()));
        Ok(())
    }

    pub(crate) fn remove_engine(&self, engine_id: u64) {
        guard(&self.inner.engines).retain(|(id, _)| *id != engine_id);
    }

    pub(crate) fn is_owned_by(&self, engine_id: u64) -> bool {
        self.inner.owner == Some(engine_id)
    }

    /// Destroy every attached engine, then the context plugins. Calling it
    /// again has no effect.
    pub fn destroy(&self) -> BoxFuture<'static, Result<()>> {
        let context = self.clone();
        async move {
            if context.inner.destroyed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }

            let engines: Vec<YanEngine> = std::mem::take(&mut *guard(&context.inner.engines))
                .into_iter()
                .filter_map(|(_, engine)| engine.upgrade())
                .collect();

            let results = join_all(engines.iter().map(|engine| engine.destroy())).await;
            let plugins = guard(&context.inner.plugins).owned();
            let plugin_result = destroy_plugins(&plugins).await;
            guard(&context.inner.plugins).clear();

            log::info!(
                "context.destroy: context destroyed - engines={}, plugins={}",
                engines.len(),
                plugins.len()
            );

            results.into_iter().collect::<Result<Vec<()>>>()?;
            plugin_result
        }
        .boxed()
    }
}
