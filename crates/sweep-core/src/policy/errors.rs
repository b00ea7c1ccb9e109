use serde::Serialize;

use crate::errors::SweepError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "violation", rename_all = "camelCase")]
pub enum PolicyViolation {
    #[error("No account id specified")]
    MissingAccount,

    #[error("Account '{account_id}' is on the blocklist")]
    BlockedAccount { account_id: String },

    #[error("Region '{region}' is not in the allowed regions ({})", .allowed.join(", "))]
    RegionNotAllowed {
        region: String,
        allowed: Vec<String>,
    },

    #[error("No regions specified")]
    NoRegionsSpecified,

    #[error("Another run already holds account '{account_id}'")]
    RunInProgress { account_id: String },
}

impl PolicyViolation {
    /// Name of the violation as reported in run outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyViolation::MissingAccount => "MissingAccount",
            PolicyViolation::BlockedAccount { .. } => "BlockedAccount",
            PolicyViolation::RegionNotAllowed { .. } => "RegionNotAllowed",
            PolicyViolation::NoRegionsSpecified => "NoRegionsSpecified",
            PolicyViolation::RunInProgress { .. } => "RunInProgress",
        }
    }
}

impl SweepError for PolicyViolation {
    fn error_code(&self) -> &'static str {
        match self {
            PolicyViolation::MissingAccount => "POLICY_MISSING_ACCOUNT",
            PolicyViolation::BlockedAccount { .. } => "POLICY_BLOCKED_ACCOUNT",
            PolicyViolation::RegionNotAllowed { .. } => "POLICY_REGION_NOT_ALLOWED",
            PolicyViolation::NoRegionsSpecified => "POLICY_NO_REGIONS",
            PolicyViolation::RunInProgress { .. } => "POLICY_RUN_IN_PROGRESS",
        }
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_account() {
        let error = PolicyViolation::BlockedAccount {
            account_id: "999".to_string(),
        };
        assert_eq!(error.to_string(), "Account '999' is on the blocklist");
        assert_eq!(error.error_code(), "POLICY_BLOCKED_ACCOUNT");
        assert_eq!(error.kind(), "BlockedAccount");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_region_not_allowed_lists_allowed_regions() {
        let error = PolicyViolation::RegionNotAllowed {
            region: "us-east-1".to_string(),
            allowed: vec!["eu-west-1".to_string(), "eu-west-2".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Region 'us-east-1' is not in the allowed regions (eu-west-1, eu-west-2)"
        );
        assert_eq!(error.error_code(), "POLICY_REGION_NOT_ALLOWED");
    }
}
