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

//! # Orbit Plugin System
//!
//! Plugin declarations ([`YanPluginDescriptor`]), name lookup
//! ([`YanPluginRegistry`]) and the instantiated set ([`YanPluginCollection`]).

pub mod collection;
pub mod plugin;
pub mod registry;

pub use collection::{YanPluginCollection, YanPluginEntry};
pub use plugin::{
    YanInertPlugin, YanPlugin, YanPluginClass, YanPluginDescriptor, YanPluginDescriptorBuilder,
    YanPluginHost, YanPluginInstance, YanPluginKey, YanPluginRef,
};
pub use registry::YanPluginRegistry;
