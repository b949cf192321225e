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

//! # Yan Core Library
//!
//! This is the main library entry point for the Yan editor runtime. Yan boots
//! a dynamic set of feature plugins into an engine, resolving their declared
//! requirements into a deterministic load order, running a two-phase async
//! initialisation and exposing runtime state (read-only mode, license gate,
//! lifecycle state) that every plugin can observe.
//!
//! ## Module Overview
//!
//! - **engine**: The engine façade, its builder and teardown
//! - **dag**: Plugin dependency resolution
//! - **orbit**: Plugin descriptors, registry and instance collection
//! - **lifecycle**: Engine state machine and plugin hook driver
//! - **lock**: Reference-counted lock registry behind read-only mode
//! - **license**: License token evaluation, trial timer and usage reporting
//! - **context**: Enclosing context shared by several engines
//! - **config**: Configuration tree, engine configuration and blueprints
//! - **command**: Named commands executed through the engine
//! - **locale**: UI and content language, translations
//! - **events**: Engine events and listeners
//! - **subsystem**: Engine-owned subsystems torn down on destroy
//!
//! ## Quick Start
//!
//! ```rust
//! use yanx::{YanEngine, YanEngineBlueprint, YanEngineConfig, YanPluginDescriptor};
//!
//! # async fn run() -> yanx::Result<()> {
//! let typing = YanPluginDescriptor::named("Typing").build();
//! let clipboard = YanPluginDescriptor::named("Clipboard").requires(["Typing"]).build();
//!
//! let blueprint = YanEngineBlueprint::new().builtin_plugins([typing, clipboard]);
//! let engine = YanEngine::create(YanEngineConfig::new().plugins(["Clipboard"]), blueprint).await?;
//!
//! assert_eq!(engine.plugins().labels(), vec!["Typing", "Clipboard"]);
//! engine.destroy().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, YanError>`. License problems are
//! not errors: they switch the engine to read-only mode and emit
//! `YanEngineEvent::LicenseBlocked`.
//!
//! ## Logging
//!
//! Yan logs through the `log` facade and installs no logger of its own.

pub mod command;
pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod events;
pub mod license;
pub mod lifecycle;
pub mod locale;
pub mod lock;
pub mod orbit;
pub mod subsystem;

mod sync;

/// Crate version reported to the license usage endpoint.
pub const YAN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use command::{YanCommand, YanCommandCollection, YanFnCommand};
pub use config::{YanConfig, YanEngineBlueprint, YanEngineConfig, YanLanguageConfig};
pub use context::{YanContext, YanWeakContext};
pub use dag::{YanPluginResolver, YanResolvedPlugins};
pub use engine::{YanEngine, YanEngineBuilder, YanWeakEngine, READ_ONLY_PROPERTY, STATE_PROPERTY};
pub use errors::{Result, YanError};
pub use events::{YanEmitter, YanEngineEvent, YanListenerId, YanPropertyChange};
pub use license::{
    evaluate_license, YanClock, YanFixedClock, YanHttpUsageClient, YanLicenseDecision,
    YanLicenseEvaluation, YanLicensePolicy, YanLicenseValidator, YanLicenseVerdict, YanSystemClock,
    YanUsageClient, YanUsageRequest, YanUsageResponse,
};
pub use lifecycle::{YanEngineState, YanLifecycle};
pub use locale::{YanLocale, YanTextDirection, YanTranslations};
pub use lock::{YanLockId, YanLockRegistry, YanSymbol};
pub use orbit::{
    YanPlugin, YanPluginClass, YanPluginCollection, YanPluginDescriptor, YanPluginHost, YanPluginKey,
    YanPluginRef, YanPluginRegistry,
};
pub use subsystem::{YanSubsystem, YanSubsystemKind};
