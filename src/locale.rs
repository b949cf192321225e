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

//! UI and content language of an engine, with message translation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Language code to message dictionary.
pub type YanTranslations = HashMap<String, HashMap<String, String>>;

const RTL_LANGUAGES: [&str; 5] = ["ar", "fa", "he", "ku", "ug"];

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YanTextDirection {
    Ltr,
    Rtl,
}

impl YanTextDirection {
    pub fn of(language: &str) -> Self {
        let primary = language.split(|c: char| c == '-' || c == '_').next().unwrap_or(language);
        if RTL_LANGUAGES.contains(&primary) {
            YanTextDirection::Rtl
        } else {
            YanTextDirection::Ltr
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct YanLocale {
    ui_language: String,
    content_language: String,
    translations: YanTranslations,
}

impl Default for YanLocale {
    fn default() -> Self {
        YanLocale::new(DEFAULT_LANGUAGE, None, YanTranslations::new())
    }
}

impl YanLocale {
    pub fn new(ui_language: &str, content_language: Option<&str>, translations: YanTranslations) -> Self {
        YanLocale {
            ui_language: ui_language.to_string(),
            content_language: content_language.unwrap_or(ui_language).to_string(),
            translations,
        }
    }

    pub fn ui_language(&self) -> &str {
        &self.ui_language
    }

    pub fn content_language(&self) -> &str {
        &self.content_language
    }

    pub fn ui_direction(&self) -> YanTextDirection {
        YanTextDirection::of(&self.ui_language)
    }

    pub fn content_direction(&self) -> YanTextDirection {
        YanTextDirection::of(&self.content_language)
    }

    /// Translate `message` into the UI language. Untranslated messages are
    /// returned as given.
    pub fn t(&self, message: &str) -> String {
        self.translations
            .get(&self.ui_language)
            .and_then(|dictionary| dictionary.get(message))
            .cloned()
            .unwrap_or_else(|| message.to_string())
    }

    /// Like [`t`](Self::t), then replaces `%0`, `%1`, ... with `values`.
    pub fn t_with(&self, message: &str, values: &[&str]) -> String {
        let mut translated = self.t(message);
        for (index, value) in values.iter().enumerate().rev() {
            translated = translated.replace(&format!("%{}", index), value);
        }
        translated
    }
}
