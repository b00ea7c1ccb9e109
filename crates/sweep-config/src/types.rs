use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_NAME: &str = "aws-nuke";
pub const DEFAULT_TAG_KEY: &str = "Cleanup";
pub const DEFAULT_TAG_VALUE: &str = "persist";
pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_CDK_BUCKET_PREFIX: &str = "cdk-";
pub const DEFAULT_SCHEDULE_EXPRESSION: &str = "manual";
pub const DEFAULT_ARTIFACT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 14;
pub const DEFAULT_TOOL_VERSION: &str = "v3.62.2";
pub const DEFAULT_TOOL_PATH: &str = "aws-nuke";

/// Schedule expression that disables the scheduled trigger.
pub const MANUAL_SCHEDULE: &str = "manual";

/// Fully resolved static configuration.
///
/// Resolved once at startup and read-only for the lifetime of the process.
/// Every invocation carries the policy subset of these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub project_name: String,
    pub protection_tag_key: String,
    pub protection_tag_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_address: Option<String>,
    pub allowed_regions: Vec<String>,
    pub blocklist_accounts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_bucket_prefix: Option<String>,
    pub cdk_bucket_prefix: String,
    pub schedule_expression: String,
    pub artifact_retention_days: u32,
    pub log_retention_days: u32,
    pub tool_version: String,
    pub enforce_version: bool,
    /// Account identity of the environment, used for scheduled runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub artifact_dir: PathBuf,
    pub tool_path: PathBuf,
    /// Reject a run while another run holds the same account.
    pub exclusive_runs: bool,
    pub timeouts: TimeoutConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            protection_tag_key: DEFAULT_TAG_KEY.to_string(),
            protection_tag_value: DEFAULT_TAG_VALUE.to_string(),
            notification_address: None,
            allowed_regions: vec![DEFAULT_REGION.to_string()],
            blocklist_accounts: Vec::new(),
            artifact_bucket_prefix: None,
            cdk_bucket_prefix: DEFAULT_CDK_BUCKET_PREFIX.to_string(),
            schedule_expression: DEFAULT_SCHEDULE_EXPRESSION.to_string(),
            artifact_retention_days: DEFAULT_ARTIFACT_RETENTION_DAYS,
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
            tool_version: DEFAULT_TOOL_VERSION.to_string(),
            enforce_version: false,
            account_id: None,
            artifact_dir: default_artifact_dir(),
            tool_path: PathBuf::from(DEFAULT_TOOL_PATH),
            exclusive_runs: false,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Name of the bucket that holds plan documents and run reports.
    ///
    /// Falls back to `unknown` for the account suffix when no account
    /// identity is configured.
    pub fn artifact_bucket(&self) -> String {
        let prefix = self
            .artifact_bucket_prefix
            .as_deref()
            .unwrap_or(&self.project_name);
        let account = self.account_id.as_deref().unwrap_or("unknown");
        format!("{}-aws-nuke-bucket-{}", prefix, account)
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule_expression.trim() != MANUAL_SCHEDULE
    }
}

/// Per-stage and whole-run time bounds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub plan_secs: u64,
    pub execution_secs: u64,
    pub notification_secs: u64,
    pub overall_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            plan_secs: 300,
            execution_secs: 900,
            notification_secs: 60,
            overall_secs: 7200,
        }
    }
}

impl TimeoutConfig {
    pub fn plan(&self) -> Duration {
        Duration::from_secs(self.plan_secs)
    }

    pub fn execution(&self) -> Duration {
        Duration::from_secs(self.execution_secs)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }

    pub fn overall(&self) -> Duration {
        Duration::from_secs(self.overall_secs)
    }
}

/// Explicit override layer: a TOML file, CLI flags, or both.
///
/// Every field is optional; an unset field defers to the environment and
/// then to the documented default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub project_name: Option<String>,
    pub protection_tag_key: Option<String>,
    pub protection_tag_value: Option<String>,
    pub notification_address: Option<String>,
    pub allowed_regions: Option<Vec<String>>,
    pub blocklist_accounts: Option<Vec<String>>,
    pub artifact_bucket_prefix: Option<String>,
    pub cdk_bucket_prefix: Option<String>,
    pub schedule_expression: Option<String>,
    pub artifact_retention_days: Option<u32>,
    pub log_retention_days: Option<u32>,
    pub tool_version: Option<String>,
    pub enforce_version: Option<bool>,
    pub account_id: Option<String>,
    pub artifact_dir: Option<PathBuf>,
    pub tool_path: Option<PathBuf>,
    pub exclusive_runs: Option<bool>,
    pub timeouts: Option<TimeoutOverrides>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutOverrides {
    pub plan_secs: Option<u64>,
    pub execution_secs: Option<u64>,
    pub notification_secs: Option<u64>,
    pub overall_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Layer `higher` on top of `self`; fields set in `higher` win.
    pub fn merge(self, higher: ConfigOverrides) -> ConfigOverrides {
        let timeouts = match (self.timeouts, higher.timeouts) {
            (Some(low), Some(high)) => Some(TimeoutOverrides {
                plan_secs: high.plan_secs.or(low.plan_secs),
                execution_secs: high.execution_secs.or(low.execution_secs),
                notification_secs: high.notification_secs.or(low.notification_secs),
                overall_secs: high.overall_secs.or(low.overall_secs),
            }),
            (low, high) => high.or(low),
        };

        ConfigOverrides {
            project_name: higher.project_name.or(self.project_name),
            protection_tag_key: higher.protection_tag_key.or(self.protection_tag_key),
            protection_tag_value: higher.protection_tag_value.or(self.protection_tag_value),
            notification_address: higher.notification_address.or(self.notification_address),
            allowed_regions: higher.allowed_regions.or(self.allowed_regions),
            blocklist_accounts: higher.blocklist_accounts.or(self.blocklist_accounts),
            artifact_bucket_prefix: higher
                .artifact_bucket_prefix
                .or(self.artifact_bucket_prefix),
            cdk_bucket_prefix: higher.cdk_bucket_prefix.or(self.cdk_bucket_prefix),
            schedule_expression: higher.schedule_expression.or(self.schedule_expression),
            artifact_retention_days: higher
                .artifact_retention_days
                .or(self.artifact_retention_days),
            log_retention_days: higher.log_retention_days.or(self.log_retention_days),
            tool_version: higher.tool_version.or(self.tool_version),
            enforce_version: higher.enforce_version.or(self.enforce_version),
            account_id: higher.account_id.or(self.account_id),
            artifact_dir: higher.artifact_dir.or(self.artifact_dir),
            tool_path: higher.tool_path.or(self.tool_path),
            exclusive_runs: higher.exclusive_runs.or(self.exclusive_runs),
            timeouts,
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("sweep"))
        .unwrap_or_else(|| PathBuf::from(".sweep"))
}
