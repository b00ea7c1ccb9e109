use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactUri;
use crate::invocation::{Invocation, ProtectionTag};

/// Everything the plan generator needs from a validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    /// Owning run; keeps artifact keys unique across concurrent runs.
    pub run_id: String,
    pub account_id: String,
    pub regions: Vec<String>,
    pub protection_tag: ProtectionTag,
    pub blocklist_accounts: Vec<String>,
    pub project_name: String,
}

impl PlanRequest {
    pub fn from_invocation(run_id: String, invocation: &Invocation, project_name: &str) -> Self {
        let policy = invocation.policy();
        Self {
            run_id,
            account_id: invocation.account_id().to_string(),
            regions: invocation.regions().to_vec(),
            protection_tag: policy.protection_tag.clone(),
            blocklist_accounts: policy.blocklist_accounts.clone(),
            project_name: project_name.to_string(),
        }
    }
}

/// Reference to a stored deletion-plan document.
///
/// Immutable once created and consumed by exactly one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanArtifact {
    pub key: String,
    pub uri: ArtifactUri,
    pub account_id: String,
    pub regions: Vec<String>,
    pub created_at: DateTime<Utc>,
}
