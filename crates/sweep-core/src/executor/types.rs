use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactUri;
use crate::executor::errors::ExecutionError;
use crate::invocation::ProtectionTag;
use crate::plan::PlanArtifact;

/// Input to one execution of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Owning run; keeps report keys unique across concurrent runs.
    pub run_id: String,
    pub plan: PlanArtifact,
    pub account_id: String,
    pub dry_run: bool,
    pub tool_version: String,
    pub enforce_version: bool,
    pub protection_tag: ProtectionTag,
}

/// One resource reported by the sweep tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub region: String,
    pub resource_type: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    pub state: String,
}

impl ResourceDescriptor {
    pub fn is_protected(&self, tag: &ProtectionTag) -> bool {
        tag.matches(&self.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub dry_run: bool,
    /// Would-be deletions under dry run, actual deletions otherwise.
    pub resources_to_delete: Vec<ResourceDescriptor>,
    /// Reported resources withheld because they carry the protection tag.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protected: Vec<ResourceDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_location: Option<ArtifactUri>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn succeeded(
        dry_run: bool,
        resources_to_delete: Vec<ResourceDescriptor>,
        output_location: Option<ArtifactUri>,
    ) -> Self {
        Self {
            success: true,
            dry_run,
            resources_to_delete,
            protected: Vec::new(),
            output_location,
            error: None,
        }
    }

    pub fn failed(
        dry_run: bool,
        error: ExecutionError,
        output_location: Option<ArtifactUri>,
    ) -> Self {
        Self {
            success: false,
            dry_run,
            resources_to_delete: Vec::new(),
            protected: Vec::new(),
            output_location,
            error: Some(error),
        }
    }

    /// Move every resource carrying `tag` out of `resources_to_delete`.
    ///
    /// Returns how many were moved. Idempotent.
    pub fn enforce_protection(&mut self, tag: &ProtectionTag) -> usize {
        let (protected, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut self.resources_to_delete)
            .into_iter()
            .partition(|r| r.is_protected(tag));
        self.resources_to_delete = remaining;
        let moved = protected.len();
        self.protected.extend(protected);
        moved
    }

    /// The error to attach to a failed run; never `None` when `success` is false.
    pub fn failure(&self) -> Option<ExecutionError> {
        if self.success {
            None
        } else {
            Some(self.error.clone().unwrap_or(ExecutionError::Unreported))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, tags: &[(&str, &str)]) -> ResourceDescriptor {
        ResourceDescriptor {
            region: "eu-west-1".to_string(),
            resource_type: "EC2Instance".to_string(),
            identifier: id.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            properties: BTreeMap::new(),
            state: "would remove".to_string(),
        }
    }

    #[test]
    fn test_enforce_protection_moves_tagged_resources() {
        let tag = ProtectionTag::new("Cleanup", "persist");
        let mut result = ExecutionResult::succeeded(
            true,
            vec![
                resource("i-1", &[]),
                resource("i-2", &[("Cleanup", "persist")]),
                resource("i-3", &[("Cleanup", "other")]),
            ],
            None,
        );

        assert_eq!(result.enforce_protection(&tag), 1);
        let ids: Vec<_> = result
            .resources_to_delete
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(ids, ["i-1", "i-3"]);
        assert_eq!(result.protected[0].identifier, "i-2");

        assert_eq!(result.enforce_protection(&tag), 0);
        assert_eq!(result.protected.len(), 1);
    }

    #[test]
    fn test_failure_is_never_empty_for_unsuccessful_result() {
        let mut result = ExecutionResult::succeeded(false, Vec::new(), None);
        assert_eq!(result.failure(), None);

        result.success = false;
        assert_eq!(result.failure(), Some(ExecutionError::Unreported));
    }
}
