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

//! # Yan Error Module
//!
//! This module defines the error types and utilities used throughout the Yan
//! editor runtime for consistent error handling and reporting.
//!
//! ## Error Handling Philosophy
//!
//! - **Fail Fast**: Configuration and programming errors (unknown plugins,
//!   circular requirements, invalid lock ids, unknown commands) are returned
//!   immediately to the caller and never retried
//! - **Degrade, Don't Crash**: License problems are not errors at all; they are
//!   decisions that switch the engine to read-only mode
//! - **Context-Rich**: Variants carry plugin names, command names and lock ids
//! - **Serde Support**: Errors can be serialized for logging and transport
//!
//! ## Error Categories
//!
//! - **Plugin resolution**: `PluginNotFound`, `CircularDependency`,
//!   `PluginRequired`, `PluginNameConflict`, `InvalidSubstitute`,
//!   `ContextPluginRequired`, `PluginNotLoaded`
//! - **Runtime state**: `InvalidLockId`, `ReadOnlyHasNoSetter`,
//!   `InvalidStateTransition`, `UnknownProperty`, `PrivateContext`
//! - **Commands**: `CommandNotFound`, `Command`
//! - **Plugins**: `Plugin` (failure raised by a plugin hook)
//! - **Infrastructure**: `Io`, `Serde`, `Http`, `Config`, `Internal`
//!
//! ## Usage
//!
//! ```rust
//! use yanx::errors::{Result, YanError};
//!
//! fn check(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(YanError::config("plugin name cannot be empty"));
//!     }
//!     Ok(())
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Yan.
pub type Result<T> = std::result::Result<T, YanError>;

/// Canonical error enumeration for Yan.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum YanError {
    /// One or more plugin names could not be resolved against the available
    /// plugins.
    #[error("plugin not found: {}", names.join(", "))]
    PluginNotFound { names: Vec<String> },

    /// Plugin requirements form a cycle. `chain` lists the path that closed it.
    #[error("circular plugin requirement: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// A plugin that survived resolution requires a plugin that was removed.
    #[error("plugin '{plugin}' is required by '{required_by}' but is not loaded")]
    PluginRequired { plugin: String, required_by: String },

    /// Two different plugin types declare the same name.
    #[error("two different plugins declare the name '{name}'")]
    PluginNameConflict { name: String },

    /// A substitute plugin cannot be used.
    #[error("invalid substitute plugin '{plugin}': {reason}")]
    InvalidSubstitute { plugin: String, reason: String },

    /// A context plugin requires a plugin that is not a context plugin.
    #[error("context plugin '{required_by}' cannot require editor plugin '{plugin}'")]
    ContextPluginRequired { plugin: String, required_by: String },

    /// Lookup of a plugin instance that is not part of the collection.
    #[error("plugin '{plugin}' is not loaded")]
    PluginNotLoaded { plugin: String },

    /// Read-only lock identifiers must be non-empty strings or symbols.
    #[error("invalid read-only lock id: {lock_id}")]
    InvalidLockId { lock_id: String },

    /// `isReadOnly` is derived from the lock registry and cannot be assigned.
    #[error("isReadOnly has no setter; use enable_read_only_mode/disable_read_only_mode")]
    ReadOnlyHasNoSetter,

    /// Lifecycle states only move forward: initializing -> ready -> destroyed.
    #[error("invalid engine state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// The property is not observable on the engine.
    #[error("unknown engine property '{name}'")]
    UnknownProperty { name: String },

    /// A context created privately by one engine was handed to another.
    #[error("context was created by another engine and cannot be shared")]
    PrivateContext,

    /// No command registered under the given name.
    #[error("command '{command}' not found")]
    CommandNotFound { command: String },

    /// Any failure raised by a command implementation.
    #[error("command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// Any failure raised by a plugin hook.
    #[error("plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Transport or status failures of outbound HTTP requests.
    #[error("http error: {0}")]
    Http(String),

    /// Malformed configuration values.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for YanError {
    fn from(err: io::Error) -> Self {
        YanError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for YanError {
    fn from(err: serde_json::Error) -> Self {
        YanError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for YanError {
    fn from(err: serde_yaml::Error) -> Self {
        YanError::Serde(err.to_string())
    }
}

impl From<reqwest::Error> for YanError {
    fn from(err: reqwest::Error) -> Self {
        YanError::Http(err.to_string())
    }
}

impl From<anyhow::Error> for YanError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<YanError>() {
            Ok(inner) => inner,
            Err(other) => YanError::Internal(format!("{:#}", other)),
        }
    }
}

impl YanError {
    /// Helper to construct plugin hook errors.
    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        YanError::Plugin {
            plugin: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct command errors.
    pub fn command(name: impl Into<String>, message: impl Into<String>) -> Self {
        YanError::Command {
            command: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        YanError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct lock id validation errors.
    pub fn invalid_lock_id<T: Into<String>>(lock_id: T) -> Self {
        YanError::InvalidLockId {
            lock_id: lock_id.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        YanError::Internal(message.into())
    }

    /// Whether the error is a configuration or programming mistake, as opposed
    /// to a runtime failure of a plugin, command or transport.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            YanError::Plugin { .. }
                | YanError::Command { .. }
                | YanError::Io(_)
                | YanError::Http(_)
                | YanError::Internal(_)
        )
    }
}
