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

use std::sync::{Arc, Mutex};
use std::time::Duration;

use yanx::license::{
    compute_verification_code, host_matches, YanLicenseOptions, YanLicensePayload, YanLicenseSink,
    TRIAL_SESSION_LIMIT,
};
use yanx::{evaluate_license, YanFixedClock, YanLicenseDecision, YanLicensePolicy, YanLicenseValidator, YanLicenseVerdict};

const NOW: i64 = 1_715_166_436;
const LATE_IN_TRIAL: i64 = 1_715_339_236;

const VALID: &str = "eyJleHAiOjIyMDg5ODg4MDAsImp0aSI6ImZvbyIsInZjIjoiNDYyYTkzMGQifQ";
const EXPIRED: &str = "eyJleHAiOjE3MDQwNjcyMDAsImp0aSI6ImZvbyIsInZjIjoiOTc4NTlGQkIifQo";
const WRONG_VC: &str = "eyJleHAiOjIyMDg5ODg4MDAsImp0aSI6ImZvbyIsInZjIjoiMTIzNDU2NzgifQo";
const MISSING_EXP: &str = "eyJqdGkiOiJmb28iLCJ2YyI6IjhjNzM2NTIxIn0";
const MISSING_JTI: &str = "eyJleHAiOjIyMDg5ODg4MDAsInZjIjoiYzU1NmFkNzQifQ";
const MISSING_VC: &str = "eyJleHAiOjIyMDg5ODg4MDAsImp0aSI6ImZvbyJ9Cg";
const LOCALHOST: &str = "eyJleHAiOjE3MTc1NDU2MDAsImp0aSI6Ijg0YWY4MjU4LTkxOTUtNDllMy1iYzRhLTkwMWIzOTJmNGQ4ZiIsImxpY2Vuc2VkSG9zdHMiOlsibG9jYWxob3N0Il0sInZjIjoiYjY0ZjAwYmQifQ";
const FACEBOOK: &str = "eyJleHAiOjE3MTc1NDU2MDAsImp0aSI6Ijc2MWI4ZWQ2LWRmZTAtNGY0OS1hMTRkLWU2YzkxZjA4Y2ZjZSIsImxpY2Vuc2VkSG9zdHMiOlsiZmFjZWJvb2suY29tIl0sInZjIjoiNmEzNDdmYzYifQ";
const WILDCARD_LOCALHOST: &str = "eyJleHAiOjE3MTUzODU2MDAsImp0aSI6IjZmZGIxN2RhLTBiODAtNDI2Yi05ODA0LTc0NTEyNTZjMWE5NyIsImxpY2Vuc2VkSG9zdHMiOlsiKi5sb2NhbGhvc3QiXSwidmMiOiJjNDMzYTk4OSJ9";
const TRIAL: &str = "eyJleHAiOjE3MTUyMTI4MDAsImp0aSI6ImJkM2ZjNTc0LTJkNGYtNGNkZS1iNWViLTIzYzk1Y2JlMjQzYSIsImxpY2Vuc2VUeXBlIjoidHJpYWwiLCJ2YyI6ImZlOTdmNzY5In0";
const USAGE_ENDPOINT: &str = "eyJleHAiOjM3ODY5MTIwMDAsImp0aSI6ImZvbyIsInVzYWdlRW5kcG9pbnQiOiJodHRwczovL2NrZWRpdG9yLmNvbSIsInZjIjoiYWI5NGFhZjYifQ";
const MULTI_HOST: &str = "eyJleHAiOjM3ODY5MTIwMDAsImp0aSI6ImZvbyIsImxpY2Vuc2VkSG9zdHMiOlsiYS5jb20iLCJhcHAubG9jYWxob3N0Il0sInZjIjoiYTJiMWNhN2QifQ";
const HOSTS_NOT_A_LIST: &str = "eyJleHAiOjM3ODY5MTIwMDAsImp0aSI6ImZvbyIsImxpY2Vuc2VkSG9zdHMiOiJsb2NhbGhvc3QiLCJ2YyI6ImI1NmYwMjcyIn0";
const EXP_MIN: &str = "eyJleHAiOi05MjIzMzcyMDM2ODU0Nzc1ODA4LCJqdGkiOiJmb28iLCJ2YyI6ImFhY2QxZmJlIn0";
const TRIAL_EXP_MIN: &str = "eyJleHAiOi05MjIzMzcyMDM2ODU0Nzc1ODA4LCJqdGkiOiJmb28iLCJsaWNlbnNlVHlwZSI6InRyaWFsIiwidmMiOiIxZWIwZmVmMyJ9";
const EXP_MAX: &str = "eyJleHAiOjkyMjMzNzIwMzY4NTQ3NzU4MDcsImp0aSI6ImZvbyIsInZjIjoiYjE1NDllYjUifQ";
const NO_USAGE_ENDPOINT: &str = "eyJleHAiOjM3ODY5MTIwMDAsImp0aSI6ImZvbyIsInZjIjoiZjA3OTJhNjYifQ";

fn token(payload: &str) -> String {
    format!("foo.{}.bar", payload)
}

fn decide(payload: &str, host: Option<&str>, now: i64) -> YanLicenseDecision {
    evaluate_license(Some(&token(payload)), host, YanFixedClock::at_timestamp(now).0)
        .verdict
        .decision
}

#[derive(Default)]
struct RecordingSink {
    blocked: Mutex<Vec<YanLicenseVerdict>>,
    warnings: Mutex<Vec<String>>,
}

impl YanLicenseSink for RecordingSink {
    fn block(&self, verdict: &YanLicenseVerdict) {
        self.blocked.lock().unwrap().push(verdict.clone());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

fn validator(payload: &str, now: i64) -> (YanLicenseValidator, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let validator = YanLicenseValidator::new(
        YanLicenseOptions {
            token: Some(token(payload)),
            host: Some("localhost".to_string()),
            clock: Arc::new(YanFixedClock::at_timestamp(now)),
            ..Default::default()
        },
        sink.clone(),
    );
    (validator, sink)
}

#[test]
fn test_missing_token_is_allowed() {
    let now = YanFixedClock::at_timestamp(NOW).0;
    assert_eq!(evaluate_license(None, None, now).verdict.decision, YanLicenseDecision::Allowed);
    assert_eq!(evaluate_license(Some(""), None, now).verdict.decision, YanLicenseDecision::Allowed);
}

#[test]
fn test_valid_token_is_allowed() {
    assert_eq!(decide(VALID, Some("localhost"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(VALID, None, NOW), YanLicenseDecision::Allowed);
}

#[test]
fn test_expired_token() {
    assert_eq!(decide(EXPIRED, Some("localhost"), NOW), YanLicenseDecision::Expired);
}

#[test]
fn test_verification_code_mismatch_is_invalid() {
    assert_eq!(decide(WRONG_VC, Some("localhost"), NOW), YanLicenseDecision::Invalid);
}

#[test]
fn test_missing_required_fields_are_invalid() {
    for payload in [MISSING_EXP, MISSING_JTI, MISSING_VC] {
        assert_eq!(decide(payload, Some("localhost"), NOW), YanLicenseDecision::Invalid, "{payload}");
    }
}

#[test]
fn test_malformed_tokens_are_invalid() {
    let now = YanFixedClock::at_timestamp(NOW).0;
    let malformed = [
        format!("{}.bar", VALID),
        "foo.JleHAiOjIyMDg5ODg4MDAsImp0aSI6ImZvbyIsInZjIjoiNDYyYTkzMGQifQ.bar".to_string(),
        "foo.eyZm9v.bar".to_string(),
        "not-a-token".to_string(),
    ];

    for token in &malformed {
        let evaluation = evaluate_license(Some(token), Some("localhost"), now);
        assert_eq!(evaluation.verdict.decision, YanLicenseDecision::Invalid, "{token}");
    }
}

#[test]
fn test_licensed_hosts_limit_the_domain() {
    assert_eq!(decide(LOCALHOST, Some("localhost"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(LOCALHOST, Some("example.com"), NOW), YanLicenseDecision::DomainLimited);
    assert_eq!(decide(LOCALHOST, None, NOW), YanLicenseDecision::DomainLimited);

    assert_eq!(decide(FACEBOOK, Some("facebook.com"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(FACEBOOK, Some("localhost"), NOW), YanLicenseDecision::DomainLimited);
    assert_eq!(decide(FACEBOOK, Some("www.facebook.com"), NOW), YanLicenseDecision::DomainLimited);
}

#[test]
fn test_wildcard_host_covers_subdomains_only() {
    assert_eq!(decide(WILDCARD_LOCALHOST, Some("app.localhost"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(WILDCARD_LOCALHOST, Some("a.b.localhost"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(WILDCARD_LOCALHOST, Some("localhost"), NOW), YanLicenseDecision::DomainLimited);
}

#[test]
fn test_trial_license_arms_session_limit() {
    let evaluation = evaluate_license(Some(&token(TRIAL)), None, YanFixedClock::at_timestamp(NOW).0);

    assert_eq!(evaluation.verdict.decision, YanLicenseDecision::Allowed);
    assert_eq!(evaluation.trial_deadline, Some(TRIAL_SESSION_LIMIT));
}

#[test]
fn test_trial_deadline_is_capped_by_expiry() {
    let exp = 1_715_212_800;
    let evaluation = evaluate_license(Some(&token(TRIAL)), None, YanFixedClock::at_timestamp(exp - 30).0);

    assert_eq!(evaluation.trial_deadline, Some(Duration::from_secs(30)));
}

#[test]
fn test_expired_trial_is_trial_limited() {
    assert_eq!(decide(TRIAL, None, LATE_IN_TRIAL), YanLicenseDecision::TrialLimited);
}

#[test]
fn test_usage_endpoint_is_read_from_payload() {
    let now = YanFixedClock::at_timestamp(NOW).0;

    let with_endpoint = evaluate_license(Some(&token(USAGE_ENDPOINT)), None, now);
    assert_eq!(with_endpoint.usage_endpoint.as_deref(), Some("https://ckeditor.com"));

    let without_endpoint = evaluate_license(Some(&token(NO_USAGE_ENDPOINT)), None, now);
    assert_eq!(without_endpoint.verdict.decision, YanLicenseDecision::Allowed);
    assert_eq!(without_endpoint.usage_endpoint, None);
}

#[test]
fn test_multiple_licensed_hosts_verify() {
    let payload = YanLicensePayload::parse(&token(MULTI_HOST)).unwrap();
    assert_eq!(compute_verification_code(payload.fields()), "a2b1ca7d");

    assert_eq!(decide(MULTI_HOST, Some("app.localhost"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(MULTI_HOST, Some("a.com"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(MULTI_HOST, Some("b.com"), NOW), YanLicenseDecision::DomainLimited);
}

#[test]
fn test_licensed_hosts_must_be_a_list() {
    let payload = YanLicensePayload::parse(&token(HOSTS_NOT_A_LIST)).unwrap();
    assert!(payload.verification_code_matches());
    assert!(payload.licensed_hosts().is_err());

    assert_eq!(decide(HOSTS_NOT_A_LIST, Some("localhost"), NOW), YanLicenseDecision::Invalid);
    assert_eq!(decide(HOSTS_NOT_A_LIST, None, NOW), YanLicenseDecision::Invalid);
}

#[test]
fn test_extreme_expiry_values() {
    assert_eq!(decide(EXP_MIN, Some("localhost"), NOW), YanLicenseDecision::Expired);
    assert_eq!(decide(EXP_MIN, Some("localhost"), -NOW), YanLicenseDecision::Expired);
    assert_eq!(decide(TRIAL_EXP_MIN, Some("localhost"), NOW), YanLicenseDecision::TrialLimited);
    assert_eq!(decide(EXP_MAX, Some("localhost"), NOW), YanLicenseDecision::Allowed);
    assert_eq!(decide(EXP_MAX, Some("localhost"), -NOW), YanLicenseDecision::Allowed);
}

#[test]
fn test_fractional_expiry_is_clamped() {
    let fields = |exp: serde_json::Value| {
        let value = serde_json::json!({ "exp": exp, "jti": "foo" });
        YanLicensePayload::from_fields(value.as_object().cloned().unwrap())
    };

    assert_eq!(fields(serde_json::json!(-1e300)).exp(), Some(i64::MIN));
    assert_eq!(fields(serde_json::json!(1e300)).exp(), Some(i64::MAX));
    assert_eq!(fields(serde_json::json!(18446744073709551615u64)).exp(), Some(i64::MAX));
    assert_eq!(fields(serde_json::json!(1715166436.5)).exp(), Some(1_715_166_436));
}

#[test]
fn test_payload_accessors() {
    let payload = YanLicensePayload::parse(&token(LOCALHOST)).unwrap();

    assert!(payload.has_required_fields());
    assert!(payload.verification_code_matches());
    assert_eq!(payload.exp(), Some(1_717_545_600));
    assert_eq!(payload.licensed_hosts().unwrap(), Some(vec!["localhost".to_string()]));
    assert!(!payload.is_trial());
    assert_eq!(compute_verification_code(payload.fields()), "b64f00bd");
}

#[test]
fn test_verification_code_is_case_insensitive() {
    let payload = YanLicensePayload::parse(&token(EXPIRED)).unwrap();
    assert!(payload.verification_code_matches());
}

#[test]
fn test_host_matching() {
    let patterns = vec!["example.com".to_string(), "*.docs.example.com".to_string()];

    assert!(host_matches(&patterns, "example.com"));
    assert!(host_matches(&patterns, "eu.docs.example.com"));
    assert!(!host_matches(&patterns, "docs.example.com"));
    assert!(!host_matches(&patterns, "www.example.com"));
}

#[test]
fn test_decision_codes_and_policy() {
    assert_eq!(YanLicenseDecision::DomainLimited.code(), "domainLimit");
    assert_eq!(YanLicenseDecision::TrialLimited.to_string(), "trialLimit");
    assert!(!YanLicenseDecision::Allowed.is_blocking());

    assert_eq!(YanLicenseVerdict::allowed().policy(), YanLicensePolicy::Allow);
    assert_eq!(
        YanLicenseVerdict::blocked(YanLicenseDecision::Expired).policy(),
        YanLicensePolicy::Block
    );

    let mut warned = YanLicenseVerdict::allowed();
    warned.warning = Some("heads up".to_string());
    assert_eq!(warned.policy(), YanLicensePolicy::AllowWithWarning);
}

#[tokio::test]
async fn test_validator_blocks_synchronously() {
    let (validator, sink) = validator(EXPIRED, NOW);

    assert_eq!(validator.verdict().decision, YanLicenseDecision::Expired);
    let blocked = sink.blocked.lock().unwrap().clone();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].decision, YanLicenseDecision::Expired);
}

#[tokio::test]
async fn test_validator_allows_valid_token() {
    let (validator, sink) = validator(VALID, NOW);

    assert_eq!(validator.verdict(), YanLicenseVerdict::allowed());
    assert!(sink.blocked.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_trial_timer_blocks_after_session_limit() {
    let (validator, sink) = validator(TRIAL, NOW);
    assert!(!validator.verdict().is_blocking());

    tokio::time::sleep(TRIAL_SESSION_LIMIT - Duration::from_secs(1)).await;
    assert!(!validator.verdict().is_blocking());
    assert!(sink.blocked.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(validator.verdict().decision, YanLicenseDecision::TrialLimited);
    assert_eq!(sink.blocked.lock().unwrap().len(), 1);
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

#[test]
fn test_trial_timer_created_outside_runtime_arms_later() {
    let (validator, sink) = validator(TRIAL, NOW);
    assert!(!validator.verdict().is_blocking());

    paused_runtime().block_on(async {
        validator.arm_trial_timer();
        validator.arm_trial_timer();

        tokio::time::sleep(TRIAL_SESSION_LIMIT - Duration::from_secs(1)).await;
        assert!(!validator.verdict().is_blocking());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(validator.verdict().decision, YanLicenseDecision::TrialLimited);
    });

    assert_eq!(sink.blocked.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_trial_timer_is_cancelled_by_shutdown() {
    let (validator, sink) = validator(TRIAL, NOW);

    validator.shutdown();
    tokio::time::sleep(TRIAL_SESSION_LIMIT * 2).await;

    assert!(!validator.verdict().is_blocking());
    assert!(sink.blocked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_trial_blocks_immediately() {
    let (validator, sink) = validator(TRIAL, LATE_IN_TRIAL);

    assert_eq!(validator.verdict().decision, YanLicenseDecision::TrialLimited);
    assert_eq!(sink.blocked.lock().unwrap().len(), 1);
}
