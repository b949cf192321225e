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

//! # Engine Module
//!
//! [`YanEngine`] is the object plugins and hosts interact with. It merges
//! configuration, resolves and boots plugins, owns read-only mode and the
//! license state, runs commands and tears everything down in a fixed order.
//!
//! ## Bootstrap
//!
//! ```ignore
//! let engine = YanEngine::builder(config)
//!     .blueprint(blueprint)
//!     .hostname("docs.example.com")
//!     .create()
//!     .await?;
//! ```
//!
//! `create` is `build` followed by [`YanEngine::init_plugins`] and
//! [`YanEngine::fire_ready`]. Hosts that need to observe the bootstrap can
//! call the three steps themselves.
//!
//! ## Teardown
//!
//! [`YanEngine::destroy`] waits for bootstrap to settle, fires `destroy`,
//! moves to `destroyed`, then tears down license tasks, commands, the data,
//! model and editing subsystems, engine-owned plugins, keystrokes and finally
//! the private context, if the engine created one.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use serde_json::Value;
use tokio::sync::watch;

use crate::command::{YanCommand, YanCommandCollection};
use crate::config::{YanConfig, YanEngineBlueprint, YanEngineConfig, YanLanguageConfig};
use crate::context::YanContext;
use crate::dag::YanPluginResolver;
use crate::errors::{Result, YanError};
use crate::events::{YanEmitter, YanEngineEvent, YanListenerId, YanPropertyChange};
use crate::license::{
    YanClock, YanHttpUsageClient, YanLicenseOptions, YanLicensePolicy, YanLicenseSink,
    YanLicenseValidator, YanLicenseVerdict, YanSystemClock, YanUsageClient,
};
use crate::lifecycle::{destroy_plugins, run_phase, YanEngineState, YanLifecycle, YanPluginPhase};
use crate::locale::YanLocale;
use crate::lock::{license_lock_id, YanLockId, YanLockRegistry};
use crate::orbit::{YanPluginCollection, YanPluginEntry, YanPluginHost};
use crate::subsystem::{YanSubsystem, YanSubsystemKind, YanSubsystems};
use crate::sync::guard;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

pub const STATE_PROPERTY: &str = "state";
pub const READ_ONLY_PROPERTY: &str = "isReadOnly";

struct YanEngineInner {
    id: u64,
    config: Mutex<YanConfig>,
    plugin_config: YanEngineConfig,
    blueprint: YanEngineBlueprint,
    context: YanContext,
    lifecycle: YanLifecycle,
    read_only: Mutex<YanLockRegistry>,
    emitter: YanEmitter,
    plugins: Mutex<YanPluginCollection>,
    commands: Mutex<YanCommandCollection>,
    subsystems: YanSubsystems,
    license: OnceLock<YanLicenseValidator>,
    usage_client: Arc<dyn YanUsageClient>,
    init_started: AtomicBool,
    destroy_started: AtomicBool,
    destroyed: watch::Sender<bool>,
}

/// Cheap, cloneable handle to an engine.
#[derive(Clone)]
pub struct YanEngine {
    inner: Arc<YanEngineInner>,
}

/// Handle that does not keep the engine alive. Plugins receive one of these.
#[derive(Clone)]
pub struct YanWeakEngine(Weak<YanEngineInner>);

impl YanWeakEngine {
    pub fn upgrade(&self) -> Option<YanEngine> {
        self.0.upgrade().map(|inner| YanEngine { inner })
    }
}

type YanBoxedListener = Box<dyn Fn(&YanEngineEvent) + Send + Sync>;

pub struct YanEngineBuilder {
    config: YanEngineConfig,
    blueprint: YanEngineBlueprint,
    hostname: Option<String>,
    clock: Arc<dyn YanClock>,
    usage_client: Option<Arc<dyn YanUsageClient>>,
    subsystems: YanSubsystems,
    listeners: Vec<YanBoxedListener>,
}

impl YanEngineBuilder {
    pub fn new(config: YanEngineConfig) -> Self {
        YanEngineBuilder {
            config,
            blueprint: YanEngineBlueprint::default(),
            hostname: None,
            clock: Arc::new(YanSystemClock),
            usage_client: None,
            subsystems: YanSubsystems::default(),
            listeners: Vec::new(),
        }
    }

    pub fn blueprint(mut self, blueprint: YanEngineBlueprint) -> Self {
        self.blueprint = blueprint;
        self
    }

    /// Host name the license is checked against.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn clock(mut self, clock: Arc<dyn YanClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn usage_client(mut self, client: Arc<dyn YanUsageClient>) -> Self {
        self.usage_client = Some(client);
        self
    }

    pub fn subsystem(mut self, kind: YanSubsystemKind, subsystem: Arc<dyn YanSubsystem>) -> Self {
        self.subsystems.set(kind, subsystem);
        self
    }

    /// Listen from the very start, including license decisions made while
    /// the engine is constructed.
    pub fn on<F>(mut self, listener: F) -> Self
    where
        F: Fn(&YanEngineEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn build(self) -> Result<YanEngine> {
        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        let YanEngineBuilder {
            mut config,
            blueprint,
            hostname,
            clock,
            usage_client,
            subsystems,
            listeners,
        } = self;

        let injected = config.context.take();
        if let Some(context) = &injected {
            if context.is_private() {
                return Err(YanError::PrivateContext);
            }
        }

        let context = match injected {
            Some(context) => context,
            None => {
                let language = config.language.clone().or_else(|| {
                    blueprint
                        .default_config
                        .get("language")
                        .and_then(|language| serde_json::from_value::<YanLanguageConfig>(language.clone()).ok())
                });
                let private = YanEngineConfig {
                    language,
                    translations: config.translations.clone(),
                    ..Default::default()
                };
                YanContext::private(&private, id)
            }
        };

        let mut merged = config.visible_options();
        merged.define_all(&blueprint.default_config);
        merged.define_all(context.config());

        let (destroyed, _) = watch::channel(false);
        let engine = YanEngine {
            inner: Arc::new(YanEngineInner {
                id,
                config: Mutex::new(merged),
                plugin_config: config.clone(),
                blueprint,
                context: context.clone(),
                lifecycle: YanLifecycle::new(),
                read_only: Mutex::new(YanLockRegistry::new()),
                emitter: YanEmitter::new(),
                plugins: Mutex::new(YanPluginCollection::new()),
                commands: Mutex::new(YanCommandCollection::new()),
                subsystems,
                license: OnceLock::new(),
                usage_client: usage_client.unwrap_or_else(|| Arc::new(YanHttpUsageClient::new())),
                init_started: AtomicBool::new(false),
                destroy_started: AtomicBool::new(false),
                destroyed,
            }),
        };

        for listener in listeners {
            engine.inner.emitter.on(listener);
        }

        context.add_engine(&engine)?;

        let sink = Arc::new(YanEngineLicenseSink {
            engine: engine.downgrade(),
        });
        let validator = YanLicenseValidator::new(
            YanLicenseOptions {
                token: config.license_key.clone(),
                host: hostname,
                clock,
                editor_version: crate::YAN_VERSION.to_string(),
            },
            sink,
        );
        let _ = engine.inner.license.set(validator);

        log::info!(
            "engine.create: engine constructed - id={}, private_context={}, read_only={}",
            id,
            engine.owns_context(),
            engine.is_read_only()
        );
        Ok(engine)
    }

    /// Build the engine, initialise its plugins and fire `ready`.
    pub async fn create(self) -> Result<YanEngine> {
        let engine = self.build()?;
        engine.init_plugins().await?;
        engine.fire_ready()?;
        Ok(engine)
    }
}

impl YanEngine {
    pub fn builder(config: YanEngineConfig) -> YanEngineBuilder {
        YanEngineBuilder::new(config)
    }

    /// Construct with an empty blueprint. Plugins are not initialised yet.
    pub fn new(config: YanEngineConfig) -> Result<YanEngine> {
        YanEngineBuilder::new(config).build()
    }

    pub async fn create(config: YanEngineConfig, blueprint: YanEngineBlueprint) -> Result<YanEngine> {
        YanEngineBuilder::new(config).blueprint(blueprint).create().await
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn downgrade(&self) -> YanWeakEngine {
        YanWeakEngine(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &YanEngine) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ----- plugins -----

    /// Resolve, instantiate and initialise plugins: `init` for every plugin
    /// in load order, then `after_init` likewise. Runs once per engine.
    pub async fn init_plugins(&self) -> Result<()> {
        if self.inner.init_started.swap(true, Ordering::SeqCst) {
            return Err(YanError::config("plugins of this engine were already initialised"));
        }

        if let Some(license) = self.inner.license.get() {
            license.arm_trial_timer();
        }

        let result = self.boot_plugins().await;
        if let Err(err) = &result {
            log::error!("engine.init.failed: plugin bootstrap failed - id={}, error={}", self.inner.id, err);
            self.inner.lifecycle.settle();
        }
        result
    }

    async fn boot_plugins(&self) -> Result<()> {
        let config = &self.inner.plugin_config;
        let context_plugins = self.inner.context.plugins();
        let provided: HashSet<_> = context_plugins.iter().map(|entry| entry.descriptor.key()).collect();

        let resolved = YanPluginResolver::new(self.inner.blueprint.builtin_plugins.clone())
            .requested(config.plugins.clone())
            .removed(config.remove_plugins.clone())
            .extra(config.extra_plugins.clone())
            .substitutes(config.substitute_plugins.clone())
            .provided(context_plugins.descriptors())
            .resolve()?;
        resolved.verify_requirements(&provided)?;

        let host = YanPluginHost::Engine(self.downgrade());
        let mut owned = Vec::new();
        for descriptor in resolved.iter().filter(|descriptor| !provided.contains(&descriptor.key())) {
            owned.push(YanPluginEntry {
                descriptor: descriptor.clone(),
                instance: descriptor.instantiate(&host)?,
                from_context: false,
            });
        }

        {
            let mut plugins = guard(&self.inner.plugins);
            for entry in context_plugins.iter() {
                plugins.insert(YanPluginEntry {
                    from_context: true,
                    ..entry.clone()
                });
            }
            for entry in &owned {
                plugins.insert(entry.clone());
            }
        }

        log::info!(
            "engine.init: plugins instantiated - id={}, plugins={}, from_context={}",
            self.inner.id,
            owned.len(),
            provided.len()
        );

        run_phase(YanPluginPhase::Init, &owned).await?;
        run_phase(YanPluginPhase::AfterInit, &owned).await?;
        Ok(())
    }

    /// Snapshot of the plugin collection, context plugins included.
    pub fn plugins(&self) -> YanPluginCollection {
        guard(&self.inner.plugins).clone()
    }

    // ----- lifecycle -----

    pub fn state(&self) -> YanEngineState {
        self.inner.lifecycle.state()
    }

    pub fn state_changes(&self) -> watch::Receiver<YanEngineState> {
        self.inner.lifecycle.subscribe()
    }

    /// Move to `ready`, fire `ready` and start the license usage check.
    pub fn fire_ready(&self) -> Result<()> {
        self.transition(YanEngineState::Ready)?;
        self.inner.emitter.emit(&YanEngineEvent::Ready);

        if let Some(license) = self.inner.license.get() {
            license.arm_trial_timer();
            license.start_usage_check(self.inner.usage_client.clone());
        }

        log::info!("engine.ready: engine is ready - id={}", self.inner.id);
        Ok(())
    }

    fn transition(&self, next: YanEngineState) -> Result<()> {
        let previous = self.inner.lifecycle.transition(next)?;
        self.emit_change(STATE_PROPERTY, next.as_str().into(), previous.as_str().into());
        Ok(())
    }

    /// Tear the engine down. A second call waits for the first to finish.
    pub async fn destroy(&self) -> Result<()> {
        if self.inner.destroy_started.swap(true, Ordering::SeqCst) {
            let mut destroyed = self.inner.destroyed.subscribe();
            let _ = destroyed.wait_for(|destroyed| *destroyed).await;
            return Ok(());
        }

        self.inner.lifecycle.wait_settled().await;

        self.inner.emitter.emit(&YanEngineEvent::Destroy);
        let mut first_error = self.transition(YanEngineState::Destroyed).err();
        let mut record = |result: Result<()>| {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        };

        if let Some(license) = self.inner.license.get() {
            license.shutdown();
        }

        let mut commands = std::mem::take(&mut *guard(&self.inner.commands));
        commands.destroy();

        let subsystems = &self.inner.subsystems;
        record(subsystems.destroy(YanSubsystemKind::Data).await);
        record(subsystems.destroy(YanSubsystemKind::Model).await);
        record(subsystems.destroy(YanSubsystemKind::Editing).await);

        let owned = guard(&self.inner.plugins).owned();
        record(destroy_plugins(&owned).await);

        record(subsystems.destroy(YanSubsystemKind::Keystrokes).await);

        let context = &self.inner.context;
        context.remove_engine(self.inner.id);
        if context.is_owned_by(self.inner.id) {
            record(context.destroy().await);
        }

        self.inner.emitter.clear();
        self.inner.destroyed.send_replace(true);

        log::info!(
            "engine.destroy: engine destroyed - id={}, plugins={}, failed={}",
            self.inner.id,
            owned.len(),
            first_error.is_some()
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // ----- read-only mode -----

    pub fn is_read_only(&self) -> bool {
        guard(&self.inner.read_only).is_engaged()
    }

    pub fn read_only_changes(&self) -> watch::Receiver<bool> {
        guard(&self.inner.read_only).subscribe()
    }

    /// Hold a read-only lock under `lock_id`.
    pub fn enable_read_only_mode(&self, lock_id: impl Into<YanLockId>) -> Result<()> {
        let flipped = guard(&self.inner.read_only).enable(lock_id)?;
        if flipped {
            self.emit_change(READ_ONLY_PROPERTY, Value::Bool(true), Value::Bool(false));
        }
        Ok(())
    }

    /// Release the read-only lock held under `lock_id`.
    pub fn disable_read_only_mode(&self, lock_id: impl Into<YanLockId>) -> Result<()> {
        let flipped = guard(&self.inner.read_only).disable(lock_id)?;
        if flipped {
            self.emit_change(READ_ONLY_PROPERTY, Value::Bool(false), Value::Bool(true));
        }
        Ok(())
    }

    pub fn enable_read_only_mode_value(&self, lock_id: &Value) -> Result<()> {
        self.enable_read_only_mode(YanLockId::from_value(lock_id)?)
    }

    pub fn disable_read_only_mode_value(&self, lock_id: &Value) -> Result<()> {
        self.disable_read_only_mode(YanLockId::from_value(lock_id)?)
    }

    // ----- observable properties -----

    pub fn property(&self, name: &str) -> Result<Value> {
        match name {
            STATE_PROPERTY => Ok(Value::String(self.state().to_string())),
            READ_ONLY_PROPERTY => Ok(Value::Bool(self.is_read_only())),
            other => Err(YanError::UnknownProperty { name: other.to_string() }),
        }
    }

    pub fn set_property(&self, name: &str, value: Value) -> Result<()> {
        match name {
            READ_ONLY_PROPERTY => Err(YanError::ReadOnlyHasNoSetter),
            STATE_PROPERTY => {
                let next = value
                    .as_str()
                    .ok_or_else(|| YanError::config(format!("engine state must be a string, got {}", value)))?
                    .parse::<YanEngineState>()?;
                self.transition(next)
            }
            other => Err(YanError::UnknownProperty { name: other.to_string() }),
        }
    }

    pub fn on<F>(&self, listener: F) -> YanListenerId
    where
        F: Fn(&YanEngineEvent) + Send + Sync + 'static,
    {
        self.inner.emitter.on(listener)
    }

    pub fn off(&self, id: YanListenerId) -> bool {
        self.inner.emitter.off(id)
    }

    fn emit_change(&self, property: &str, value: Value, old_value: Value) {
        self.inner.emitter.emit(&YanEngineEvent::Change(YanPropertyChange {
            property: property.to_string(),
            value,
            old_value,
        }));
    }

    // ----- commands -----

    pub fn add_command(&self, name: impl Into<String>, command: impl YanCommand + 'static) {
        guard(&self.inner.commands).add(name, command);
    }

    pub fn commands(&self) -> YanCommandCollection {
        guard(&self.inner.commands).clone()
    }

    /// Run the command registered as `command`. Disabled commands, and
    /// data-changing commands while read-only, do nothing and return null.
    pub fn execute(&self, command: &str, args: &[Value]) -> Result<Value> {
        let handler = guard(&self.inner.commands)
            .get(command)
            .ok_or_else(|| YanError::CommandNotFound {
                command: command.to_string(),
            })?;

        if !handler.is_enabled() || (handler.affects_data() && self.is_read_only()) {
            log::debug!(
                "engine.execute.skipped: command is disabled - command={}, read_only={}",
                command,
                self.is_read_only()
            );
            return Ok(Value::Null);
        }

        handler.execute(args)
    }

    // ----- configuration and locale -----

    pub fn config(&self) -> YanConfig {
        guard(&self.inner.config).clone()
    }

    pub fn config_value(&self, path: &str) -> Option<Value> {
        guard(&self.inner.config).get(path).cloned()
    }

    pub fn set_config(&self, path: &str, value: impl Into<Value>) {
        guard(&self.inner.config).set(path, value);
    }

    pub fn define_config(&self, path: &str, value: impl Into<Value>) {
        guard(&self.inner.config).define(path, value);
    }

    pub fn context(&self) -> YanContext {
        self.inner.context.clone()
    }

    /// Whether the engine created its context itself.
    pub fn owns_context(&self) -> bool {
        self.inner.context.is_owned_by(self.inner.id)
    }

    pub fn locale(&self) -> YanLocale {
        self.inner.context.locale().clone()
    }

    pub fn t(&self, message: &str) -> String {
        self.inner.context.locale().t(message)
    }

    // ----- license -----

    pub fn license_verdict(&self) -> YanLicenseVerdict {
        self.inner
            .license
            .get()
            .map(YanLicenseValidator::verdict)
            .unwrap_or_default()
    }

    pub fn license_policy(&self) -> YanLicensePolicy {
        self.license_verdict().policy()
    }

    /// Wait for a pending license usage check to finish.
    pub async fn await_license_checks(&self) {
        if let Some(license) = self.inner.license.get() {
            license.settled().await;
        }
    }
}

impl fmt::Debug for YanEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YanEngine")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

struct YanEngineLicenseSink {
    engine: YanWeakEngine,
}

impl YanLicenseSink for YanEngineLicenseSink {
    fn block(&self, verdict: &YanLicenseVerdict) {
        if let Some(engine) = self.engine.upgrade() {
            if let Err(err) = engine.enable_read_only_mode(license_lock_id()) {
                log::error!("license.block.failed: could not lock the engine - id={}, error={}", engine.id(), err);
            }
            engine.inner.emitter.emit(&YanEngineEvent::LicenseBlocked(verdict.clone()));
        }
    }

    fn warn(&self, message: &str) {
        if let Some(engine) = self.engine.upgrade() {
            engine.inner.emitter.emit(&YanEngineEvent::LicenseWarning(message.to_string()));
        }
    }
}
