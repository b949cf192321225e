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

//! # Command Module
//!
//! Named commands that plugins register on the engine and hosts run through
//! `YanEngine::execute`. Commands that change document data are suppressed
//! while the engine is read-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::Result;

pub trait YanCommand: Send + Sync {
    fn execute(&self, args: &[Value]) -> Result<Value>;

    fn is_enabled(&self) -> bool {
        true
    }

    /// Whether running the command modifies document data.
    fn affects_data(&self) -> bool {
        true
    }

    fn destroy(&self) {}
}

type YanCommandFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Command backed by a closure.
#[derive(Clone)]
pub struct YanFnCommand {
    run: YanCommandFn,
    enabled: bool,
    affects_data: bool,
}

impl YanFnCommand {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        YanFnCommand {
            run: Arc::new(run),
            enabled: true,
            affects_data: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn affects_data(mut self, affects_data: bool) -> Self {
        self.affects_data = affects_data;
        self
    }
}

impl fmt::Debug for YanFnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YanFnCommand")
            .field("enabled", &self.enabled)
            .field("affects_data", &self.affects_data)
            .finish()
    }
}

impl YanCommand for YanFnCommand {
    fn execute(&self, args: &[Value]) -> Result<Value> {
        (self.run)(args)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn affects_data(&self) -> bool {
        self.affects_data
    }
}

#[derive(Clone, Default)]
pub struct YanCommandCollection {
    commands: HashMap<String, Arc<dyn YanCommand>>,
}

impl YanCommandCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` under `name`, replacing any previous command.
    pub fn add(&mut self, name: impl Into<String>, command: impl YanCommand + 'static) {
        self.commands.insert(name.into(), Arc::new(command));
    }

    pub fn add_shared(&mut self, name: impl Into<String>, command: Arc<dyn YanCommand>) {
        self.commands.insert(name.into(), command);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn YanCommand>> {
        self.commands.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Destroy and drop every command.
    pub fn destroy(&mut self) {
        for (name, command) in self.commands.drain() {
            log::debug!("command.destroy: command destroyed - command={}", name);
            command.destroy();
        }
    }
}
