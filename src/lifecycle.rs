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

//! # Lifecycle Module
//!
//! The engine state machine and the sequential driver for plugin hooks.
//!
//! ## States
//!
//! `Initializing -> Ready -> Destroyed`. Each transition happens at most once.
//! An engine whose bootstrap failed may go straight from `Initializing` to
//! `Destroyed`.
//!
//! ## Phases
//!
//! [`run_phase`] awaits one hook per plugin, in load order, and stops at the
//! first failure. [`destroy_plugins`] starts every teardown in reverse load
//! order and reports the first failure once all of them finished.

use std::fmt;
use std::str::FromStr;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::{Result, YanError};
use crate::orbit::YanPluginEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YanEngineState {
    Initializing,
    Ready,
    Destroyed,
}

impl YanEngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            YanEngineState::Initializing => "initializing",
            YanEngineState::Ready => "ready",
            YanEngineState::Destroyed => "destroyed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, YanEngineState::Destroyed)
    }

    pub fn can_transition_to(&self, next: YanEngineState) -> bool {
        matches!(
            (self, next),
            (YanEngineState::Initializing, YanEngineState::Ready)
                | (YanEngineState::Initializing, YanEngineState::Destroyed)
                | (YanEngineState::Ready, YanEngineState::Destroyed)
        )
    }
}

impl fmt::Display for YanEngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YanEngineState {
    type Err = YanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "initializing" => Ok(YanEngineState::Initializing),
            "ready" => Ok(YanEngineState::Ready),
            "destroyed" => Ok(YanEngineState::Destroyed),
            other => Err(YanError::config(format!("unknown engine state '{}'", other))),
        }
    }
}

/// Observable state plus a "settled" flag that flips once bootstrap either
/// reached `Ready` or failed.
#[derive(Debug)]
pub struct YanLifecycle {
    state: watch::Sender<YanEngineState>,
    settled: watch::Sender<bool>,
}

impl Default for YanLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl YanLifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(YanEngineState::Initializing);
        let (settled, _) = watch::channel(false);
        YanLifecycle { state, settled }
    }

    pub fn state(&self) -> YanEngineState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<YanEngineState> {
        self.state.subscribe()
    }

    /// Move to `next` and return the previous state.
    pub fn transition(&self, next: YanEngineState) -> Result<YanEngineState> {
        let mut previous = None;
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                previous = Some(*current);
                *current = next;
                true
            } else {
                false
            }
        });

        let previous = previous.ok_or_else(|| YanError::InvalidStateTransition {
            from: self.state().to_string(),
            to: next.to_string(),
        })?;

        if next != YanEngineState::Initializing {
            self.settle();
        }
        Ok(previous)
    }

    /// Mark bootstrap as finished without reaching `Ready`.
    pub fn settle(&self) {
        self.settled.send_replace(true);
    }

    pub fn is_settled(&self) -> bool {
        *self.settled.borrow()
    }

    pub async fn wait_settled(&self) {
        let mut settled = self.settled.subscribe();
        let _ = settled.wait_for(|settled| *settled).await;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YanPluginPhase {
    Init,
    AfterInit,
}

impl fmt::Display for YanPluginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YanPluginPhase::Init => f.write_str("init"),
            YanPluginPhase::AfterInit => f.write_str("after_init"),
        }
    }
}

/// Run `phase` for every entry in order. Each hook completes before the next
/// one starts; the first failure is returned unchanged.
pub async fn run_phase(phase: YanPluginPhase, entries: &[YanPluginEntry]) -> Result<()> {
    for entry in entries {
        log::debug!(
            "lifecycle.plugin.{}: running plugin hook - plugin={}",
            phase,
            entry.descriptor.label()
        );

        let result = match phase {
            YanPluginPhase::Init => entry.plugin().init().await,
            YanPluginPhase::AfterInit => entry.plugin().after_init().await,
        };

        if let Err(err) = result {
            log::error!(
                "lifecycle.plugin.failed: plugin hook failed - plugin={}, phase={}, error={}",
                entry.descriptor.label(),
                phase,
                err
            );
            return Err(err);
        }
    }
    Ok(())
}

/// Destroy every entry, starting from the last loaded one.
pub async fn destroy_plugins(entries: &[YanPluginEntry]) -> Result<()> {
    let results = join_all(entries.iter().rev().map(|entry| async move {
        let result = entry.plugin().destroy().await;
        if let Err(err) = &result {
            log::error!(
                "lifecycle.plugin.destroy_failed: plugin teardown failed - plugin={}, error={}",
                entry.descriptor.label(),
                err
            );
        }
        result
    }))
    .await;

    results.into_iter().collect::<Result<Vec<()>>>().map(|_| ())
}
