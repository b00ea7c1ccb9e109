//! Deletion-plan document in the external sweep tool's config shape.
//!
//! Every plan protects, in addition to the configured protection tag, the
//! infrastructure the workflow itself runs on: the artifact bucket, the
//! CDK bootstrap toolkit, Control Tower resources, and anything named after
//! the project.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::plan::errors::GenerationError;
use crate::plan::types::PlanRequest;

/// Resource types the tool never touches: removed with their parent,
/// deprecated, or known to fail.
pub const EXCLUDED_RESOURCE_TYPES: &[&str] = &[
    "EC2NetworkInterface",
    "EC2DHCPOption",
    "EC2InternetGatewayAttachment",
    "BedrockModelCustomizationJob",
    "CloudSearchDomain",
    "CodeStarProject",
    "ElasticTranscoder*",
    "FMSNotificationChannel",
    "FMSPolicy",
    "OpsWorks*",
    "QLDBLedger",
    "Lex*",
    "MachineLearning*",
    "RoboMaker*",
    "ShieldProtection*",
    "AWS::Timestream::*",
];

/// Filter key applied to every resource type.
pub const GLOBAL_FILTER: &str = "__global__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NukePlanDocument {
    pub regions: Vec<String>,
    pub blocklist: Vec<String>,
    #[serde(rename = "resource-types")]
    pub resource_types: ResourceTypes,
    pub accounts: BTreeMap<String, AccountFilters>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTypes {
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilters {
    pub filters: BTreeMap<String, Vec<Filter>>,
}

/// A single keep-rule: resources whose `property` matches `value` survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub property: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FilterKind>,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Glob,
}

impl Filter {
    pub fn exact(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            kind: None,
            value: value.into(),
        }
    }

    pub fn glob(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            kind: Some(FilterKind::Glob),
            value: value.into(),
        }
    }
}

impl NukePlanDocument {
    pub fn build(request: &PlanRequest, artifact_bucket: &str, cdk_bucket_prefix: &str) -> Self {
        let account = &request.account_id;
        let project = &request.project_name;
        let tag = &request.protection_tag;

        let mut filters = BTreeMap::new();
        filters.insert(
            GLOBAL_FILTER.to_string(),
            vec![
                Filter::exact(format!("tag:{}", tag.key), tag.value.clone()),
                Filter::exact("tag:aws:cloudformation:stack-name", "CDKToolkit"),
                Filter::glob(
                    "tag:aws:cloudformation:stack-name",
                    "StackSet-AWSControlTowerBP-*",
                ),
                Filter::glob("Name", "aws-controltower-*"),
                Filter::glob("Name", "AWSControlTower*"),
                Filter::glob("Name", format!("{}*", project)),
            ],
        );
        filters.insert(
            "S3Object".to_string(),
            vec![
                Filter::exact("Bucket", artifact_bucket),
                Filter::glob("Bucket", format!("{}-*", cdk_bucket_prefix)),
            ],
        );
        filters.insert(
            "SNSTopic".to_string(),
            vec![Filter::glob(
                "TopicARN",
                format!("arn:aws:sns:*:{}:aws-controltower-*", account),
            )],
        );
        filters.insert(
            "SNSSubscription".to_string(),
            vec![
                Filter::glob(
                    "TopicARN",
                    format!("arn:aws:sns:*:{}:{}-*", account, project),
                ),
                Filter::glob(
                    "TopicARN",
                    format!("arn:aws:sns:*:{}:aws-controltower-*", account),
                ),
            ],
        );
        filters.insert(
            "CloudWatchLogsLogGroup".to_string(),
            vec![
                Filter::glob("Name", format!("/aws/lambda/{}-*", project)),
                Filter::glob("Name", "/aws/lambda/aws-controltower-*"),
            ],
        );
        filters.insert(
            "CloudFormationStack".to_string(),
            vec![Filter::glob("Name", "StackSet-AWSControlTowerBP-*")],
        );

        let mut accounts = BTreeMap::new();
        accounts.insert(account.clone(), AccountFilters { filters });

        Self {
            regions: request.regions.clone(),
            blocklist: request.blocklist_accounts.clone(),
            resource_types: ResourceTypes {
                excludes: EXCLUDED_RESOURCE_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            accounts,
        }
    }

    pub fn to_yaml(&self) -> Result<String, GenerationError> {
        serde_yaml::to_string(self).map_err(|e| GenerationError::RenderFailed {
            message: e.to_string(),
        })
    }

    /// Filters that keep resources of `resource_type` in `account_id`, global ones included.
    pub fn keep_filters(&self, account_id: &str, resource_type: &str) -> Vec<&Filter> {
        let Some(account) = self.accounts.get(account_id) else {
            return Vec::new();
        };
        [GLOBAL_FILTER, resource_type]
            .iter()
            .filter_map(|key| account.filters.get(*key))
            .flatten()
            .collect()
    }
}
