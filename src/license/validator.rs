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

//! # License Validator Module
//!
//! Owns the license state of one engine: the current verdict, the trial timer
//! and the usage check task. Decisions are pushed to a [`YanLicenseSink`],
//! which the engine implements to engage read-only mode and fire events.

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::clock::{YanClock, YanSystemClock};
use super::usage::{YanUsageClient, YanUsageRequest};
use super::{evaluate_license, YanLicenseDecision, YanLicenseVerdict};
use crate::sync::guard;

/// Receiver of license decisions.
pub trait YanLicenseSink: Send + Sync {
    /// Called once, when the first blocking decision is made.
    fn block(&self, verdict: &YanLicenseVerdict);

    fn warn(&self, message: &str);
}

#[derive(Clone)]
pub struct YanLicenseOptions {
    pub token: Option<String>,
    pub host: Option<String>,
    pub clock: Arc<dyn YanClock>,
    pub editor_version: String,
}

impl Default for YanLicenseOptions {
    fn default() -> Self {
        YanLicenseOptions {
            token: None,
            host: None,
            clock: Arc::new(YanSystemClock),
            editor_version: crate::YAN_VERSION.to_string(),
        }
    }
}

impl std::fmt::Debug for YanLicenseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YanLicenseOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("editor_version", &self.editor_version)
            .finish()
    }
}

struct YanLicenseState {
    verdict: Mutex<YanLicenseVerdict>,
    sink: Arc<dyn YanLicenseSink>,
}

impl YanLicenseState {
    fn block(&self, decision: YanLicenseDecision, message: Option<String>) {
        let verdict = {
            let mut current = guard(&self.verdict);
            if current.is_blocking() || !decision.is_blocking() {
                return;
            }
            current.decision = decision;
            current.message = message;
            current.clone()
        };

        log::warn!(
            "license.blocked: editor switched to read-only mode - decision={}, message={}",
            verdict.decision,
            verdict.message.as_deref().unwrap_or("")
        );
        self.sink.block(&verdict);
    }

    fn warn(&self, message: String) {
        guard(&self.verdict).warning = Some(message.clone());
        log::warn!("license.warning: usage endpoint reported a message - message={}", message);
        self.sink.warn(&message);
    }
}

pub struct YanLicenseValidator {
    state: Arc<YanLicenseState>,
    token: Option<String>,
    editor_version: String,
    usage_endpoint: Option<String>,
    trial_deadline: Mutex<Option<Instant>>,
    trial_task: Mutex<Option<JoinHandle<()>>>,
    usage_task: Mutex<Option<JoinHandle<()>>>,
}

impl YanLicenseValidator {
    /// Evaluate the token and report a blocking decision to `sink` right
    /// away. A valid trial license fixes its deadline now and arms the timer
    /// on the current tokio runtime, or on the first call to
    /// [`arm_trial_timer`](Self::arm_trial_timer) made inside one.
    pub fn new(options: YanLicenseOptions, sink: Arc<dyn YanLicenseSink>) -> Self {
        let evaluation = evaluate_license(
            options.token.as_deref(),
            options.host.as_deref(),
            options.clock.now(),
        );

        let state = Arc::new(YanLicenseState {
            verdict: Mutex::new(YanLicenseVerdict::allowed()),
            sink,
        });

        let validator = YanLicenseValidator {
            state,
            token: options.token,
            editor_version: options.editor_version,
            usage_endpoint: evaluation.usage_endpoint,
            trial_deadline: Mutex::new(evaluation.trial_deadline.map(|delay| Instant::now() + delay)),
            trial_task: Mutex::new(None),
            usage_task: Mutex::new(None),
        };

        if evaluation.verdict.is_blocking() {
            validator.state.block(evaluation.verdict.decision, evaluation.verdict.message);
            return validator;
        }

        validator.arm_trial_timer();
        validator
    }

    /// Start the trial timer if a deadline is pending. Without a tokio
    /// runtime the deadline stays pending for a later call.
    pub fn arm_trial_timer(&self) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                if guard(&self.trial_deadline).is_some() {
                    log::debug!("license.trial.pending: no tokio runtime yet; trial timer deferred");
                }
                return;
            }
        };
        let deadline = match guard(&self.trial_deadline).take() {
            Some(deadline) => deadline,
            None => return,
        };

        let state = Arc::clone(&self.state);
        let task = handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            state.block(YanLicenseDecision::TrialLimited, None);
        });
        *guard(&self.trial_task) = Some(task);
        log::debug!(
            "license.trial.armed: trial session timer started - deadline_secs={}",
            deadline.saturating_duration_since(Instant::now()).as_secs()
        );
    }

    pub fn verdict(&self) -> YanLicenseVerdict {
        guard(&self.state.verdict).clone()
    }

    pub fn usage_endpoint(&self) -> Option<&str> {
        self.usage_endpoint.as_deref()
    }

    /// Report usage to the endpoint named by the token, if any. Runs in the
    /// background; transport failures are logged and otherwise ignored.
    pub fn start_usage_check(&self, client: Arc<dyn YanUsageClient>) {
        let (endpoint, token) = match (&self.usage_endpoint, &self.token) {
            (Some(endpoint), Some(token)) => (endpoint.clone(), token.clone()),
            _ => return,
        };
        if self.verdict().is_blocking() {
            return;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("license.usage.skipped: no tokio runtime available - endpoint={}", endpoint);
                return;
            }
        };

        let state = Arc::clone(&self.state);
        let request = YanUsageRequest::new(token, self.editor_version.clone());
        let task = handle.spawn(async move {
            match client.report_usage(&endpoint, &request).await {
                Ok(response) => {
                    log::debug!(
                        "license.usage.reported: usage endpoint answered - endpoint={}, status={}",
                        endpoint,
                        response.status
                    );
                    if let Some(message) = response.message.clone() {
                        state.warn(message);
                    }
                    if !response.is_ok() {
                        state.block(YanLicenseDecision::UsageLimited, response.message);
                    }
                }
                Err(err) => {
                    log::error!("license.usage.failed: usage check failed - endpoint={}, error={}", endpoint, err);
                }
            }
        });

        *guard(&self.usage_task) = Some(task);
    }

    /// Wait until the usage check, if one was started, has finished.
    pub async fn settled(&self) {
        let task = guard(&self.usage_task).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Cancel the trial timer and any pending usage check.
    pub fn shutdown(&self) {
        guard(&self.trial_deadline).take();
        for slot in [&self.trial_task, &self.usage_task] {
            if let Some(task) = guard(slot).take() {
                task.abort();
            }
        }
    }
}

impl Drop for YanLicenseValidator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
