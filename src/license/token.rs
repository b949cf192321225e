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

//! # License Token Module
//!
//! Parsing of `header.payload.signature` tokens and the payload checks that do
//! not depend on time: format, required fields, verification code and
//! licensed hosts.
//!
//! The verification code (`vc`) is a CRC-32 (IEEE) of every other non-null
//! payload value, concatenated in sorted key order. Values are stringified
//! the way a JavaScript runtime coerces them to strings, so tokens minted by
//! the browser tooling verify unchanged.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::errors::{Result, YanError};

const REQUIRED_FIELDS: [&str; 3] = ["exp", "jti", "vc"];

const CRC32_TABLE: [u32; 256] = crc32_table();

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decoded payload of a license token.
#[derive(Clone, Debug, PartialEq)]
pub struct YanLicensePayload {
    fields: Map<String, Value>,
}

impl YanLicensePayload {
    /// Split the token and decode its payload. Returns `None` for anything
    /// that is not three non-empty parts with a base64 JSON object in the
    /// middle.
    pub fn parse(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
            return None;
        }

        let payload = parts[1];
        if !payload.starts_with("ey") {
            return None;
        }

        let normalised = payload.replace('-', "+").replace('_', "/");
        let bytes = LENIENT_BASE64.decode(normalised.trim_end_matches('=')).ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            Value::Object(fields) => Some(YanLicensePayload { fields }),
            _ => None,
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        YanLicensePayload { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    pub fn has_required_fields(&self) -> bool {
        REQUIRED_FIELDS.iter().all(|key| self.get(key).is_some())
    }

    /// Expiry in seconds since the epoch. Out-of-range numbers clamp to the
    /// `i64` bounds.
    pub fn exp(&self) -> Option<i64> {
        let exp = self.get("exp")?;
        if let Some(secs) = exp.as_i64() {
            return Some(secs);
        }
        if exp.as_u64().is_some() {
            return Some(i64::MAX);
        }
        exp.as_f64()
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    pub fn is_trial(&self) -> bool {
        self.get("licenseType").and_then(Value::as_str) == Some("trial")
    }

    pub fn usage_endpoint(&self) -> Option<&str> {
        self.get("usageEndpoint").and_then(Value::as_str)
    }

    /// Licensed host patterns, `None` when the payload sets no restriction.
    /// A `licensedHosts` that is not a list of strings is a config error.
    pub fn licensed_hosts(&self) -> Result<Option<Vec<String>>> {
        let hosts = match self.get("licensedHosts") {
            Some(hosts) => hosts,
            None => return Ok(None),
        };
        hosts
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .map(Some)
            .ok_or_else(|| YanError::config("licensedHosts must be a list of host names"))
    }

    pub fn verification_code_matches(&self) -> bool {
        match self.get("vc") {
            Some(vc) => js_string(vc).eq_ignore_ascii_case(&compute_verification_code(&self.fields)),
            None => false,
        }
    }
}

/// CRC-32 over the stringified non-null values of `fields` except `vc`,
/// in sorted key order, as lowercase zero-padded hex. Top-level array items
/// are concatenated without a separator.
pub fn compute_verification_code(fields: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = fields.keys().filter(|key| key.as_str() != "vc").collect();
    keys.sort();

    let mut data = String::new();
    for key in keys {
        let value = &fields[key.as_str()];
        match value {
            Value::Null => {}
            Value::Array(items) => items.iter().for_each(|item| data.push_str(&js_string(item))),
            other => data.push_str(&js_string(other)),
        }
    }

    format!("{:08x}", crc32(data.as_bytes()))
}

/// Whether `host` is covered by one of the licensed host patterns.
/// `*.example.com` covers strict subdomains only.
pub fn host_matches(patterns: &[String], host: &str) -> bool {
    patterns.iter().any(|pattern| {
        if pattern == host {
            return true;
        }
        match pattern.strip_prefix('*') {
            Some(suffix) if suffix.starts_with('.') => host.ends_with(suffix),
            _ => false,
        }
    })
}

fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => js_number(number),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn js_number(number: &serde_json::Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => number.to_string(),
    }
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in bytes {
        crc = CRC32_TABLE[((crc ^ *byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}

const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 == 1 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}
