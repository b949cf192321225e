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

//! Engine-owned subsystems torn down during `destroy`.
//!
//! The runtime does not implement data, model, editing or keystroke handling;
//! it only owns the slots and tears them down in a fixed order. Hosts plug in
//! real implementations through the engine builder.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum YanSubsystemKind {
    Data,
    Model,
    Editing,
    Keystrokes,
}

impl YanSubsystemKind {
    /// Teardown order, interleaved with plugin teardown before `Keystrokes`.
    pub const TEARDOWN_ORDER: [YanSubsystemKind; 4] = [
        YanSubsystemKind::Data,
        YanSubsystemKind::Model,
        YanSubsystemKind::Editing,
        YanSubsystemKind::Keystrokes,
    ];
}

impl fmt::Display for YanSubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            YanSubsystemKind::Data => "data",
            YanSubsystemKind::Model => "model",
            YanSubsystemKind::Editing => "editing",
            YanSubsystemKind::Keystrokes => "keystrokes",
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait YanSubsystem: Send + Sync {
    async fn destroy(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct YanInertSubsystem;

#[async_trait]
impl YanSubsystem for YanInertSubsystem {}

#[derive(Clone)]
pub struct YanSubsystems {
    pub data: Arc<dyn YanSubsystem>,
    pub model: Arc<dyn YanSubsystem>,
    pub editing: Arc<dyn YanSubsystem>,
    pub keystrokes: Arc<dyn YanSubsystem>,
}

impl Default for YanSubsystems {
    fn default() -> Self {
        YanSubsystems {
            data: Arc::new(YanInertSubsystem),
            model: Arc::new(YanInertSubsystem),
            editing: Arc::new(YanInertSubsystem),
            keystrokes: Arc::new(YanInertSubsystem),
        }
    }
}

impl YanSubsystems {
    pub fn set(&mut self, kind: YanSubsystemKind, subsystem: Arc<dyn YanSubsystem>) {
        match kind {
            YanSubsystemKind::Data => self.data = subsystem,
            YanSubsystemKind::Model => self.model = subsystem,
            YanSubsystemKind::Editing => self.editing = subsystem,
            YanSubsystemKind::Keystrokes => self.keystrokes = subsystem,
        }
    }

    pub fn get(&self, kind: YanSubsystemKind) -> &Arc<dyn YanSubsystem> {
        match kind {
            YanSubsystemKind::Data => &self.data,
            YanSubsystemKind::Model => &self.model,
            YanSubsystemKind::Editing => &self.editing,
            YanSubsystemKind::Keystrokes => &self.keystrokes,
        }
    }

    pub async fn destroy(&self, kind: YanSubsystemKind) -> Result<()> {
        let result = self.get(kind).destroy().await;
        if let Err(err) = &result {
            log::error!("engine.subsystem.destroy_failed: subsystem teardown failed - subsystem={}, error={}", kind, err);
        }
        result
    }
}
