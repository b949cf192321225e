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

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

use yanx::{YanConfig, YanEngineConfig, YanError, YanLanguageConfig, YanPluginRef};

#[test]
fn test_config_dotted_paths() {
    let mut config = YanConfig::new();
    config.set("image.toolbar", json!(["imageTextAlternative"]));
    config.set("image.upload.types", json!(["png"]));

    assert_eq!(config.get("image.toolbar"), Some(&json!(["imageTextAlternative"])));
    assert_eq!(config.get("image.upload"), Some(&json!({"types": ["png"]})));
    assert!(config.has("image"));
    assert!(!config.has("image.resize"));
    assert_eq!(config.get("image.toolbar.0"), None);
}

#[test]
fn test_config_set_replaces_non_object_parent() {
    let mut config = YanConfig::new();
    config.set("heading", "plain");
    config.set("heading.options", json!([1, 2]));

    assert_eq!(config.get("heading"), Some(&json!({"options": [1, 2]})));
}

#[test]
fn test_config_define_never_overwrites() {
    let mut config = YanConfig::new();
    config.set("heading", "plain");
    config.define("heading.options", json!([1, 2]));
    config.define("placeholder", "Type here");
    config.define("placeholder", "Ignored");

    assert_eq!(config.get_str("heading"), Some("plain"));
    assert_eq!(config.get_str("placeholder"), Some("Type here"));
}

#[test]
fn test_config_merge_and_define_all() {
    let mut base = YanConfig::from_value(json!({"toolbar": {"items": ["bold"]}, "language": "en"})).unwrap();
    let defaults = YanConfig::from_value(json!({"toolbar": {"items": ["italic"], "sticky": true}, "width": 100})).unwrap();

    let mut defined = base.clone();
    defined.define_all(&defaults);
    assert_eq!(
        defined.to_value(),
        json!({"toolbar": {"items": ["bold"], "sticky": true}, "language": "en", "width": 100})
    );

    base.merge(&defaults);
    assert_eq!(base.get("toolbar.items"), Some(&json!(["italic"])));
    assert_eq!(base.get("width"), Some(&json!(100)));
}

#[test]
fn test_config_remove() {
    let mut config = YanConfig::from_value(json!({"a": {"b": 1, "c": 2}})).unwrap();

    assert_eq!(config.remove("a.b"), Some(json!(1)));
    assert_eq!(config.remove("a.missing"), None);
    assert_eq!(config.remove("x.y"), None);
    assert_eq!(config.to_value(), json!({"a": {"c": 2}}));
}

#[test]
fn test_config_root_must_be_object() {
    assert!(matches!(YanConfig::from_value(json!([1])), Err(YanError::Config { .. })));
    assert!(YanConfig::from_value(json!(null)).unwrap().is_empty());
}

#[test]
fn test_config_load_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "toolbar:\n  items:\n    - bold\n    - italic\nlanguage: pl").unwrap();

    let config = YanConfig::load(file.path()).unwrap();

    assert_eq!(config.get("toolbar.items"), Some(&json!(["bold", "italic"])));
    assert_eq!(config.get_str("language"), Some("pl"));
}

#[test]
fn test_config_load_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"placeholder": "Type here", "width": 640}}"#).unwrap();

    let config = YanConfig::load(file.path()).unwrap();

    assert_eq!(config.get_str("placeholder"), Some("Type here"));
    assert_eq!(config.get("width"), Some(&json!(640)));
}

#[test]
fn test_config_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = YanConfig::load(dir.path().join("absent.json"));

    assert!(matches!(result, Err(YanError::Io(_))));
}

fn labels(plugins: &[YanPluginRef]) -> Vec<String> {
    plugins.iter().map(|plugin| plugin.label().to_string()).collect()
}

#[test]
fn test_engine_config_from_yaml() {
    let config = YanEngineConfig::from_yaml_str(
        r#"
plugins: [Essentials, Paragraph]
removePlugins: [Heading]
extraPlugins: [Comments]
language:
  ui: pl
  content: ar
licenseKey: foo.bar.baz
translations:
  pl:
    Bold: Pogrubienie
placeholder: Type here
"#,
    )
    .unwrap();

    assert_eq!(labels(&config.plugins), vec!["Essentials", "Paragraph"]);
    assert_eq!(labels(&config.remove_plugins), vec!["Heading"]);
    assert_eq!(labels(&config.extra_plugins), vec!["Comments"]);
    assert_eq!(
        config.language,
        Some(YanLanguageConfig::Split {
            ui: Some("pl".to_string()),
            content: Some("ar".to_string())
        })
    );
    assert_eq!(config.license_key.as_deref(), Some("foo.bar.baz"));
    assert_eq!(config.translations["pl"]["Bold"], "Pogrubienie");
    assert_eq!(config.options.get_str("placeholder"), Some("Type here"));
    assert!(!config.options.has("plugins"));
}

#[test]
fn test_engine_config_rejects_non_name_plugins() {
    let result = YanEngineConfig::from_json_str(r#"{"plugins": [1]}"#);
    assert!(matches!(result, Err(YanError::Config { .. })));

    let result = YanEngineConfig::from_json_str(r#"{"plugins": "Essentials"}"#);
    assert!(matches!(result, Err(YanError::Config { .. })));
}

#[test]
fn test_language_config_forms() {
    let code: YanLanguageConfig = serde_json::from_value(json!("de")).unwrap();
    assert_eq!(code.ui(), Some("de"));
    assert_eq!(code.content(), Some("de"));

    let ui_only: YanLanguageConfig = serde_json::from_value(json!({"ui": "fr"})).unwrap();
    assert_eq!(ui_only.ui(), Some("fr"));
    assert_eq!(ui_only.content(), Some("fr"));
}
