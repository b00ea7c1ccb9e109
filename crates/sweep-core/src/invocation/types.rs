use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sweep_config::SweepConfig;
use tracing::warn;

/// Key/value pair that exempts a cloud resource from deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionTag {
    pub key: String,
    pub value: String,
}

impl ProtectionTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when `tags` carries exactly this key with exactly this value.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.get(&self.key).is_some_and(|v| v == &self.value)
    }
}

/// Static policy parameters carried through every invocation.
///
/// Built once from [`SweepConfig`] and shared read-only between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyParams {
    pub protection_tag: ProtectionTag,
    pub blocklist_accounts: Vec<String>,
    pub allowed_regions: Vec<String>,
    pub tool_version: String,
    pub enforce_version: bool,
}

impl PolicyParams {
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            protection_tag: ProtectionTag::new(
                config.protection_tag_key.clone(),
                config.protection_tag_value.clone(),
            ),
            blocklist_accounts: ordered_set(config.blocklist_accounts.iter().cloned()),
            allowed_regions: ordered_set(config.allowed_regions.iter().cloned()),
            tool_version: config.tool_version.clone(),
            enforce_version: config.enforce_version,
        }
    }

    pub fn is_blocked(&self, account_id: &str) -> bool {
        self.blocklist_accounts.iter().any(|a| a == account_id)
    }

    pub fn is_region_allowed(&self, region: &str) -> bool {
        self.allowed_regions.iter().any(|r| r == region)
    }
}

/// Operator-supplied body of a manual run request.
///
/// `dryRun` and `sendNotification` default to `true` when omitted, so an
/// incomplete request never deletes anything and always reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub account_id: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default = "default_true")]
    pub send_notification: bool,
    /// Engine-internal; accepted for schema compatibility and ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// A single request to run one cleanup cycle.
///
/// Only two constructors exist. [`Invocation::manual`] takes the mode flags
/// from the operator; [`Invocation::scheduled`] fixes them to
/// `dry_run = false`, `send_notification = false` and reads nothing from
/// external input. Neither constructor validates: that is the policy
/// guard's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    account_id: String,
    regions: Vec<String>,
    dry_run: bool,
    send_notification: bool,
    scheduled: bool,
    policy: Arc<PolicyParams>,
}

impl Invocation {
    pub fn manual(request: InvocationRequest, policy: Arc<PolicyParams>) -> Self {
        if request.scheduled == Some(true) {
            warn!(
                event = "core.invocation.scheduled_flag_ignored",
                account_id = %request.account_id,
                "Manual requests cannot mark themselves as scheduled"
            );
        }

        Self {
            account_id: request.account_id.trim().to_string(),
            regions: dedupe(request.regions),
            dry_run: request.dry_run,
            send_notification: request.send_notification,
            scheduled: false,
            policy,
        }
    }

    /// Pre-approved automatic invocation covering every allowed region.
    pub fn scheduled(account_id: impl Into<String>, policy: Arc<PolicyParams>) -> Self {
        let regions = policy.allowed_regions.clone();
        Self {
            account_id: account_id.into(),
            regions,
            dry_run: false,
            send_notification: false,
            scheduled: true,
            policy,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn send_notification(&self) -> bool {
        self.send_notification
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn policy(&self) -> &PolicyParams {
        &self.policy
    }
}

/// Trim and deduplicate operator input, keeping first-seen order. Blank
/// entries are kept so the policy guard rejects them.
fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim().to_string();
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Deduplicate while keeping first-seen order; blank entries are dropped.
fn ordered_set(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Arc<PolicyParams> {
        Arc::new(PolicyParams::from_config(&SweepConfig {
            allowed_regions: vec!["eu-west-1".to_string(), "eu-west-2".to_string()],
            blocklist_accounts: vec!["999".to_string()],
            ..Default::default()
        }))
    }

    #[test]
    fn test_request_defaults_are_safe() {
        let request: InvocationRequest =
            serde_json::from_str(r#"{"accountId": "111", "regions": ["eu-west-1"]}"#).unwrap();
        assert!(request.dry_run);
        assert!(request.send_notification);
        assert_eq!(request.scheduled, None);
    }

    #[test]
    fn test_manual_invocation_keeps_operator_flags() {
        let request = InvocationRequest {
            account_id: " 111 ".to_string(),
            regions: vec![
                "eu-west-2".to_string(),
                "eu-west-1".to_string(),
                "eu-west-2".to_string(),
            ],
            dry_run: false,
            send_notification: true,
            scheduled: None,
        };
        let invocation = Invocation::manual(request, policy());
        assert_eq!(invocation.account_id(), "111");
        assert_eq!(invocation.regions(), ["eu-west-2", "eu-west-1"]);
        assert!(!invocation.dry_run());
        assert!(invocation.send_notification());
        assert!(!invocation.is_scheduled());
    }

    #[test]
    fn test_manual_invocation_keeps_blank_regions() {
        let request = InvocationRequest {
            account_id: "111".to_string(),
            regions: vec![" ".to_string(), "eu-west-1".to_string(), "".to_string()],
            dry_run: true,
            send_notification: true,
            scheduled: None,
        };
        let invocation = Invocation::manual(request, policy());
        assert_eq!(invocation.regions(), ["", "eu-west-1"]);
    }

    #[test]
    fn test_manual_invocation_cannot_claim_scheduled() {
        let request = InvocationRequest {
            account_id: "111".to_string(),
            regions: vec!["eu-west-1".to_string()],
            dry_run: true,
            send_notification: true,
            scheduled: Some(true),
        };
        assert!(!Invocation::manual(request, policy()).is_scheduled());
    }

    #[test]
    fn test_scheduled_invocation_has_fixed_flags() {
        let invocation = Invocation::scheduled("111", policy());
        assert!(!invocation.dry_run());
        assert!(!invocation.send_notification());
        assert!(invocation.is_scheduled());
        assert_eq!(invocation.regions(), ["eu-west-1", "eu-west-2"]);
    }

    #[test]
    fn test_protection_tag_requires_exact_value() {
        let tag = ProtectionTag::new("Cleanup", "persist");
        let mut tags = BTreeMap::new();
        tags.insert("Cleanup".to_string(), "persist".to_string());
        assert!(tag.matches(&tags));

        tags.insert("Cleanup".to_string(), "Persist".to_string());
        assert!(!tag.matches(&tags));

        assert!(!tag.matches(&BTreeMap::new()));
    }

    #[test]
    fn test_policy_params_lookup() {
        let params = policy();
        assert!(params.is_blocked("999"));
        assert!(!params.is_blocked("111"));
        assert!(params.is_region_allowed("eu-west-2"));
        assert!(!params.is_region_allowed("us-east-1"));
    }
}
