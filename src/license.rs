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

//! # License Module
//!
//! Evaluation of license tokens and the decisions that gate the engine.
//!
//! ## Decisions
//!
//! Exactly one [`YanLicenseDecision`] is active per engine. Anything other than
//! `Allowed` engages the reserved license lock, switching the engine to
//! read-only mode. Decisions never revert.
//!
//! ## Checks
//!
//! [`evaluate_license`] performs every synchronous check, in order:
//!
//! 1. Token format and payload decoding (`Invalid`)
//! 2. Required fields and verification code (`Invalid`)
//! 3. Licensed hosts (`DomainLimited`)
//! 4. Trial expiry (`TrialLimited`), arming a timer when still valid
//! 5. Expiry (`Expired`)
//!
//! The usage endpoint check runs later, once the engine is ready, and may
//! still block with `UsageLimited`. See [`YanLicenseValidator`].

pub mod clock;
pub mod token;
pub mod usage;
pub mod validator;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use clock::{YanClock, YanFixedClock, YanSystemClock};
pub use token::{compute_verification_code, host_matches, YanLicensePayload};
pub use usage::{YanHttpUsageClient, YanUsageClient, YanUsageRequest, YanUsageResponse, YanUsageTelemetry};
pub use validator::{YanLicenseOptions, YanLicenseSink, YanLicenseValidator};

/// Longest delay before a valid trial license locks the engine.
pub const TRIAL_SESSION_LIMIT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YanLicenseDecision {
    Allowed,
    Invalid,
    Expired,
    DomainLimited,
    TrialLimited,
    UsageLimited,
}

impl YanLicenseDecision {
    pub fn is_blocking(&self) -> bool {
        !matches!(self, YanLicenseDecision::Allowed)
    }

    /// Short code used in logs and events.
    pub fn code(&self) -> &'static str {
        match self {
            YanLicenseDecision::Allowed => "ok",
            YanLicenseDecision::Invalid => "invalid",
            YanLicenseDecision::Expired => "expired",
            YanLicenseDecision::DomainLimited => "domainLimit",
            YanLicenseDecision::TrialLimited => "trialLimit",
            YanLicenseDecision::UsageLimited => "usageLimit",
        }
    }
}

impl fmt::Display for YanLicenseDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// What the engine should do with its current license state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum YanLicensePolicy {
    Block,
    Allow,
    AllowWithWarning,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YanLicenseVerdict {
    pub decision: YanLicenseDecision,
    pub message: Option<String>,
    pub warning: Option<String>,
}

impl Default for YanLicenseVerdict {
    fn default() -> Self {
        Self::allowed()
    }
}

impl YanLicenseVerdict {
    pub fn allowed() -> Self {
        YanLicenseVerdict {
            decision: YanLicenseDecision::Allowed,
            message: None,
            warning: None,
        }
    }

    pub fn blocked(decision: YanLicenseDecision) -> Self {
        YanLicenseVerdict {
            decision,
            message: None,
            warning: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.decision.is_blocking()
    }

    pub fn policy(&self) -> YanLicensePolicy {
        if self.decision.is_blocking() {
            YanLicensePolicy::Block
        } else if self.warning.is_some() {
            YanLicensePolicy::AllowWithWarning
        } else {
            YanLicensePolicy::Allow
        }
    }
}

/// Outcome of the synchronous checks.
#[derive(Clone, Debug, PartialEq)]
pub struct YanLicenseEvaluation {
    pub verdict: YanLicenseVerdict,
    /// Delay after which a still-valid trial license must lock the engine.
    pub trial_deadline: Option<Duration>,
    /// Endpoint to report usage to once the engine is ready.
    pub usage_endpoint: Option<String>,
}

impl YanLicenseEvaluation {
    fn decided(decision: YanLicenseDecision) -> Self {
        YanLicenseEvaluation {
            verdict: if decision.is_blocking() {
                YanLicenseVerdict::blocked(decision)
            } else {
                YanLicenseVerdict::allowed()
            },
            trial_deadline: None,
            usage_endpoint: None,
        }
    }
}

/// Run every synchronous license check for `token` as seen from `host` at
/// `now`. A missing or empty token is allowed.
pub fn evaluate_license(token: Option<&str>, host: Option<&str>, now: DateTime<Utc>) -> YanLicenseEvaluation {
    let token = match token.map(str::trim) {
        Some(token) if !token.is_empty() => token,
        _ => return YanLicenseEvaluation::decided(YanLicenseDecision::Allowed),
    };

    let payload = match YanLicensePayload::parse(token) {
        Some(payload) => payload,
        None => return YanLicenseEvaluation::decided(YanLicenseDecision::Invalid),
    };

    if !payload.has_required_fields() || !payload.verification_code_matches() {
        return YanLicenseEvaluation::decided(YanLicenseDecision::Invalid);
    }

    let exp = match payload.exp() {
        Some(exp) => exp,
        None => return YanLicenseEvaluation::decided(YanLicenseDecision::Invalid),
    };

    match payload.licensed_hosts() {
        Ok(Some(patterns)) => {
            let licensed = host.map_or(false, |host| host_matches(&patterns, host));
            if !licensed {
                return YanLicenseEvaluation::decided(YanLicenseDecision::DomainLimited);
            }
        }
        Ok(None) => {}
        Err(_) => return YanLicenseEvaluation::decided(YanLicenseDecision::Invalid),
    }

    let remaining = exp.saturating_sub(now.timestamp());
    let mut evaluation = YanLicenseEvaluation::decided(YanLicenseDecision::Allowed);

    if payload.is_trial() {
        if remaining <= 0 {
            return YanLicenseEvaluation::decided(YanLicenseDecision::TrialLimited);
        }
        evaluation.trial_deadline = Some(TRIAL_SESSION_LIMIT.min(Duration::from_secs(remaining as u64)));
    } else if remaining <= 0 {
        return YanLicenseEvaluation::decided(YanLicenseDecision::Expired);
    }

    evaluation.usage_endpoint = payload.usage_endpoint().map(str::to_string);
    evaluation
}
