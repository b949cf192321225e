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

//! # License Usage Module
//!
//! Reporting of editor usage to the endpoint named by the license token.
//! The transport sits behind [`YanUsageClient`] so hosts can route the request
//! through their own HTTP stack; [`YanHttpUsageClient`] is the reqwest-backed
//! default.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, YanError};

/// Body of the usage request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YanUsageRequest {
    pub license: String,
    pub telemetry: YanUsageTelemetry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YanUsageTelemetry {
    #[serde(rename = "editorVersion")]
    pub editor_version: String,
}

impl YanUsageRequest {
    pub fn new(license: impl Into<String>, editor_version: impl Into<String>) -> Self {
        YanUsageRequest {
            license: license.into(),
            telemetry: YanUsageTelemetry {
                editor_version: editor_version.into(),
            },
        }
    }
}

/// Answer of the usage endpoint. Any `status` other than `"ok"` blocks the
/// engine; `message` is surfaced as a warning either way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YanUsageResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl YanUsageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[async_trait]
pub trait YanUsageClient: Send + Sync {
    async fn report_usage(&self, endpoint: &str, request: &YanUsageRequest) -> Result<YanUsageResponse>;
}

/// Usage client backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct YanHttpUsageClient {
    client: reqwest::Client,
}

impl Default for YanHttpUsageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YanHttpUsageClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        YanHttpUsageClient { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        YanHttpUsageClient { client }
    }
}

#[async_trait]
impl YanUsageClient for YanHttpUsageClient {
    async fn report_usage(&self, endpoint: &str, request: &YanUsageRequest) -> Result<YanUsageResponse> {
        let response = self.client.post(endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(YanError::Http(format!("HTTP Response: {}", status.as_u16())));
        }

        Ok(response.json::<YanUsageResponse>().await?)
    }
}
