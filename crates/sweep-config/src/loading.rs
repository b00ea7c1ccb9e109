//! Configuration loading: override file, environment, defaults.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::resolver::{Resolver, env_bool, env_list, env_parsed, env_string, non_empty};
use crate::types::{
    ConfigOverrides, DEFAULT_CDK_BUCKET_PREFIX, DEFAULT_PROJECT_NAME, DEFAULT_REGION,
    DEFAULT_SCHEDULE_EXPRESSION, DEFAULT_TAG_KEY, DEFAULT_TAG_VALUE, DEFAULT_TOOL_VERSION,
    SweepConfig, TimeoutConfig, TimeoutOverrides,
};

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "sweep.toml";

/// Read an override file.
///
/// An explicit path must exist. Without one, `./sweep.toml` is used when
/// present and an empty override layer otherwise.
pub fn load_overrides(explicit: Option<&Path>) -> Result<ConfigOverrides, ConfigError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::ConfigNotFound {
                    path: path.display().to_string(),
                });
            }
            path.to_path_buf()
        }
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !local.exists() {
                debug!(event = "config.loading.override_file_absent");
                return Ok(ConfigOverrides::default());
            }
            local
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let overrides: ConfigOverrides =
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
            message: format!("{}: {}", path.display(), e),
        })?;

    info!(
        event = "config.loading.override_file_loaded",
        path = %path.display()
    );
    Ok(overrides)
}

impl SweepConfig {
    /// Resolve every field: explicit override, then `SWEEP_*` environment,
    /// then the documented default. The result is validated.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = SweepConfig::default();
        let timeouts = overrides.timeouts.unwrap_or_default();

        let config = SweepConfig {
            project_name: string_value(
                "project_name",
                &overrides.project_name,
                "SWEEP_PROJECT_NAME",
                DEFAULT_PROJECT_NAME,
            )?,
            protection_tag_key: string_value(
                "protection_tag_key",
                &overrides.protection_tag_key,
                "SWEEP_TAG_KEY",
                DEFAULT_TAG_KEY,
            )?,
            protection_tag_value: string_value(
                "protection_tag_value",
                &overrides.protection_tag_value,
                "SWEEP_TAG_VALUE",
                DEFAULT_TAG_VALUE,
            )?,
            notification_address: optional_string(
                "notification_address",
                &overrides.notification_address,
                "SWEEP_NOTIFICATION_ADDRESS",
            )?,
            allowed_regions: list_value(
                "allowed_regions",
                &overrides.allowed_regions,
                "SWEEP_ALLOWED_REGIONS",
            )?
            .unwrap_or_else(|| vec![DEFAULT_REGION.to_string()]),
            blocklist_accounts: list_value(
                "blocklist_accounts",
                &overrides.blocklist_accounts,
                "SWEEP_BLOCKLIST_ACCOUNTS",
            )?
            .unwrap_or_default(),
            artifact_bucket_prefix: optional_string(
                "artifact_bucket_prefix",
                &overrides.artifact_bucket_prefix,
                "SWEEP_ARTIFACT_BUCKET_PREFIX",
            )?,
            cdk_bucket_prefix: string_value(
                "cdk_bucket_prefix",
                &overrides.cdk_bucket_prefix,
                "SWEEP_CDK_BUCKET_PREFIX",
                DEFAULT_CDK_BUCKET_PREFIX,
            )?,
            schedule_expression: string_value(
                "schedule_expression",
                &overrides.schedule_expression,
                "SWEEP_SCHEDULE_EXPRESSION",
                DEFAULT_SCHEDULE_EXPRESSION,
            )?,
            artifact_retention_days: Resolver::new("artifact_retention_days")
                .then(|| overrides.artifact_retention_days)
                .then_try(|| {
                    env_parsed("SWEEP_ARTIFACT_RETENTION_DAYS", "a whole number of days")
                })
                .resolve_or(defaults.artifact_retention_days)?,
            log_retention_days: Resolver::new("log_retention_days")
                .then(|| overrides.log_retention_days)
                .then_try(|| env_parsed("SWEEP_LOG_RETENTION_DAYS", "a whole number of days"))
                .resolve_or(defaults.log_retention_days)?,
            tool_version: string_value(
                "tool_version",
                &overrides.tool_version,
                "SWEEP_TOOL_VERSION",
                DEFAULT_TOOL_VERSION,
            )?,
            enforce_version: Resolver::new("enforce_version")
                .then(|| overrides.enforce_version)
                .then_try(|| env_bool("SWEEP_ENFORCE_VERSION"))
                .resolve_or(defaults.enforce_version)?,
            account_id: optional_string("account_id", &overrides.account_id, "SWEEP_ACCOUNT_ID")?,
            artifact_dir: Resolver::new("artifact_dir")
                .then(|| overrides.artifact_dir.clone())
                .then(|| env_string("SWEEP_ARTIFACT_DIR").map(PathBuf::from))
                .resolve_or(defaults.artifact_dir)?,
            tool_path: Resolver::new("tool_path")
                .then(|| overrides.tool_path.clone())
                .then(|| env_string("SWEEP_TOOL_PATH").map(PathBuf::from))
                .resolve_or(defaults.tool_path)?,
            exclusive_runs: Resolver::new("exclusive_runs")
                .then(|| overrides.exclusive_runs)
                .then_try(|| env_bool("SWEEP_EXCLUSIVE_RUNS"))
                .resolve_or(defaults.exclusive_runs)?,
            timeouts: resolve_timeouts(&timeouts),
        };

        config.validate()?;

        info!(
            event = "config.loading.resolved",
            project_name = %config.project_name,
            allowed_regions = ?config.allowed_regions,
            blocklist_count = config.blocklist_accounts.len(),
            schedule_expression = %config.schedule_expression,
            enforce_version = config.enforce_version,
        );

        Ok(config)
    }

    /// Reject configurations the engine cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_name.trim().is_empty() {
            return Err(invalid("project_name must not be empty"));
        }
        if self.protection_tag_key.trim().is_empty() {
            return Err(invalid("protection_tag_key must not be empty"));
        }
        if self.allowed_regions.is_empty() {
            return Err(invalid("allowed_regions must list at least one region"));
        }
        if self.allowed_regions.iter().any(|r| r.trim().is_empty()) {
            return Err(invalid("allowed_regions must not contain blank entries"));
        }
        let t = &self.timeouts;
        if t.plan_secs == 0 || t.execution_secs == 0 || t.notification_secs == 0 {
            return Err(invalid("stage timeouts must be greater than zero"));
        }
        if t.overall_secs == 0 {
            return Err(invalid("overall timeout must be greater than zero"));
        }
        if self.is_scheduled() && self.account_id.is_none() {
            return Err(invalid(
                "account_id is required when schedule_expression is not 'manual'",
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}

fn string_value(
    key: &'static str,
    explicit: &Option<String>,
    var: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    Resolver::new(key)
        .then(|| explicit.clone().and_then(non_empty))
        .then(|| env_string(var))
        .resolve_or_else(|| default.to_string())
}

fn optional_string(
    key: &'static str,
    explicit: &Option<String>,
    var: &'static str,
) -> Result<Option<String>, ConfigError> {
    Resolver::new(key)
        .then(|| explicit.clone().and_then(non_empty))
        .then(|| env_string(var))
        .resolve()
}

fn list_value(
    key: &'static str,
    explicit: &Option<Vec<String>>,
    var: &'static str,
) -> Result<Option<Vec<String>>, ConfigError> {
    Resolver::new(key)
        .then(|| {
            explicit
                .as_ref()
                .map(|items| crate::resolver::split_list(&items.join(",")))
                .filter(|items| !items.is_empty())
        })
        .then(|| env_list(var))
        .resolve()
}

fn resolve_timeouts(explicit: &TimeoutOverrides) -> TimeoutConfig {
    let defaults = TimeoutConfig::default();
    TimeoutConfig {
        plan_secs: explicit.plan_secs.unwrap_or(defaults.plan_secs),
        execution_secs: explicit.execution_secs.unwrap_or(defaults.execution_secs),
        notification_secs: explicit
            .notification_secs
            .unwrap_or(defaults.notification_secs),
        overall_secs: explicit.overall_secs.unwrap_or(defaults.overall_secs),
    }
}
