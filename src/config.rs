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

//! # Configuration Module
//!
//! [`YanConfig`] is a JSON tree addressed by dotted paths (`"toolbar.items"`).
//! Setting an object merges it key by key into what is already there;
//! defining only fills keys that are still absent.
//!
//! [`YanEngineConfig`] carries the construction input of one engine and
//! [`YanEngineBlueprint`] the static description of an engine variant.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::YanContext;
use crate::errors::{Result, YanError};
use crate::locale::YanTranslations;
use crate::orbit::{YanPluginDescriptor, YanPluginRef};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YanConfig {
    root: Map<String, Value>,
}

impl YanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(YanConfig { root }),
            Value::Null => Ok(YanConfig::new()),
            other => Err(YanError::config(format!(
                "configuration root must be an object, got {}",
                other
            ))),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_value(serde_yaml::from_str(text)?)
    }

    /// Load a configuration file. `.yaml` and `.yml` files are read as YAML,
    /// anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            _ => Self::from_json_str(&text)?,
        };
        log::debug!(
            "config.load: configuration file loaded - path={}, keys={}",
            path.display(),
            config.root.len()
        );
        Ok(config)
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set `value` at `path`, overwriting leaves. Objects are merged.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        assign(&mut self.root, path, value.into(), false);
    }

    /// Like [`set`](Self::set) but never overwrites an existing value.
    pub fn define(&mut self, path: &str, value: impl Into<Value>) {
        assign(&mut self.root, path, value.into(), true);
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };
        let target = match parent {
            Some(parent) => {
                let mut current = &mut self.root;
                for segment in parent.split('.') {
                    current = current.get_mut(segment)?.as_object_mut()?;
                }
                current
            }
            None => &mut self.root,
        };
        target.remove(leaf)
    }

    /// Merge every key of `other`, which wins on conflicts.
    pub fn merge(&mut self, other: &YanConfig) {
        for (key, value) in &other.root {
            assign(&mut self.root, key, value.clone(), false);
        }
    }

    /// Merge every key of `other` that is still absent here.
    pub fn define_all(&mut self, other: &YanConfig) {
        for (key, value) in &other.root {
            assign(&mut self.root, key, value.clone(), true);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.root.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

fn assign(root: &mut Map<String, Value>, path: &str, value: Value, define_only: bool) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = match segments.pop() {
        Some(leaf) => leaf,
        None => return,
    };

    let mut target = root;
    for segment in segments {
        let slot = target
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            if define_only {
                return;
            }
            *slot = Value::Object(Map::new());
        }
        target = match slot.as_object_mut() {
            Some(object) => object,
            None => return,
        };
    }

    merge_value(target, leaf, value, define_only);
}

fn merge_value(target: &mut Map<String, Value>, key: &str, value: Value, define_only: bool) {
    match target.get_mut(key) {
        Some(Value::Object(existing)) if value.is_object() => {
            if let Value::Object(incoming) = value {
                for (child, child_value) in incoming {
                    merge_value(existing, &child, child_value, define_only);
                }
            }
        }
        Some(_) if define_only => {}
        _ => {
            target.insert(key.to_string(), value);
        }
    }
}

/// `language` option: a single code, or separate UI and content languages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YanLanguageConfig {
    Code(String),
    Split {
        #[serde(default)]
        ui: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
}

impl YanLanguageConfig {
    pub fn ui(&self) -> Option<&str> {
        match self {
            YanLanguageConfig::Code(code) => Some(code),
            YanLanguageConfig::Split { ui, .. } => ui.as_deref(),
        }
    }

    /// Content language, defaulting to the UI language.
    pub fn content(&self) -> Option<&str> {
        match self {
            YanLanguageConfig::Code(code) => Some(code),
            YanLanguageConfig::Split { ui, content } => content.as_deref().or(ui.as_deref()),
        }
    }
}

impl From<&str> for YanLanguageConfig {
    fn from(code: &str) -> Self {
        YanLanguageConfig::Code(code.to_string())
    }
}

impl From<String> for YanLanguageConfig {
    fn from(code: String) -> Self {
        YanLanguageConfig::Code(code)
    }
}

/// Static description of an engine variant.
#[derive(Clone, Debug, Default)]
pub struct YanEngineBlueprint {
    pub builtin_plugins: Vec<YanPluginDescriptor>,
    pub default_config: YanConfig,
}

impl YanEngineBlueprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin_plugins(mut self, plugins: impl IntoIterator<Item = YanPluginDescriptor>) -> Self {
        self.builtin_plugins.extend(plugins);
        self
    }

    pub fn default_config(mut self, config: YanConfig) -> Self {
        self.default_config = config;
        self
    }
}

/// Construction input of one engine.
#[derive(Clone, Default)]
pub struct YanEngineConfig {
    pub plugins: Vec<YanPluginRef>,
    pub remove_plugins: Vec<YanPluginRef>,
    pub extra_plugins: Vec<YanPluginRef>,
    pub substitute_plugins: Vec<YanPluginDescriptor>,
    pub context: Option<YanContext>,
    pub language: Option<YanLanguageConfig>,
    pub license_key: Option<String>,
    pub translations: YanTranslations,
    pub options: YanConfig,
}

impl YanEngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object such as a parsed configuration file.
    /// `plugins`, `removePlugins` and `extraPlugins` are read as plugin names,
    /// `substitutePlugins` and `context` cannot be expressed this way.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut options = YanConfig::from_value(value)?;
        let mut config = YanEngineConfig::new();

        config.plugins = take_names(&mut options, "plugins")?;
        config.remove_plugins = take_names(&mut options, "removePlugins")?;
        config.extra_plugins = take_names(&mut options, "extraPlugins")?;

        if let Some(language) = options.remove("language") {
            config.language = Some(serde_json::from_value(language)?);
        }
        if let Some(key) = options.remove("licenseKey") {
            config.license_key = key.as_str().map(str::to_string);
        }
        if let Some(translations) = options.remove("translations") {
            config.translations = serde_json::from_value(translations)?;
        }

        config.options = options;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_value(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn plugins<I, R>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.plugins.extend(plugins.into_iter().map(Into::into));
        self
    }

    pub fn remove_plugins<I, R>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.remove_plugins.extend(plugins.into_iter().map(Into::into));
        self
    }

    pub fn extra_plugins<I, R>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<YanPluginRef>,
    {
        self.extra_plugins.extend(plugins.into_iter().map(Into::into));
        self
    }

    pub fn substitute_plugins(mut self, plugins: impl IntoIterator<Item = YanPluginDescriptor>) -> Self {
        self.substitute_plugins.extend(plugins);
        self
    }

    pub fn context(mut self, context: YanContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn language(mut self, language: impl Into<YanLanguageConfig>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn license_key(mut self, key: impl Into<String>) -> Self {
        self.license_key = Some(key.into());
        self
    }

    pub fn translations(mut self, language: impl Into<String>, dictionary: HashMap<String, String>) -> Self {
        self.translations.entry(language.into()).or_default().extend(dictionary);
        self
    }

    pub fn option(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.options.set(path, value);
        self
    }

    pub fn options(mut self, options: YanConfig) -> Self {
        self.options.merge(&options);
        self
    }

    /// Options as seen through `YanEngine::config`, without the reserved
    /// `context` and `translations` entries.
    pub(crate) fn visible_options(&self) -> YanConfig {
        let mut visible = self.options.clone();
        if !self.plugins.is_empty() {
            visible.set("plugins", labels(&self.plugins));
        }
        if !self.remove_plugins.is_empty() {
            visible.set("removePlugins", labels(&self.remove_plugins));
        }
        if !self.extra_plugins.is_empty() {
            visible.set("extraPlugins", labels(&self.extra_plugins));
        }
        if let Some(language) = &self.language {
            if let Ok(language) = serde_json::to_value(language) {
                visible.set("language", language);
            }
        }
        if let Some(key) = &self.license_key {
            visible.set("licenseKey", key.clone());
        }
        visible.remove("context");
        visible.remove("translations");
        visible
    }
}

impl std::fmt::Debug for YanEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YanEngineConfig")
            .field("plugins", &labels(&self.plugins))
            .field("remove_plugins", &labels(&self.remove_plugins))
            .field("extra_plugins", &labels(&self.extra_plugins))
            .field("substitute_plugins", &self.substitute_plugins)
            .field("has_context", &self.context.is_some())
            .field("language", &self.language)
            .field("options", &self.options)
            .finish()
    }
}

fn labels(plugins: &[YanPluginRef]) -> Vec<String> {
    plugins.iter().map(|plugin| plugin.label().to_string()).collect()
}

fn take_names(options: &mut YanConfig, key: &str) -> Result<Vec<YanPluginRef>> {
    match options.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(YanPluginRef::Name(name)),
                other => Err(YanError::config(format!("'{}' entries must be plugin names, got {}", key, other))),
            })
            .collect(),
        Some(other) => Err(YanError::config(format!("'{}' must be a list of plugin names, got {}", key, other))),
    }
}
