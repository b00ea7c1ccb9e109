//! Executor backed by the external sweep tool binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::artifacts::{ArtifactStore, ArtifactUri, OUTPUT_PREFIX, key_timestamp};
use crate::executor::errors::{ExecutionError, ExecutorError};
use crate::executor::output::{extract_version, filter_output, parse_resource_line, versions_match};
use crate::executor::traits::Executor;
use crate::executor::types::{ExecutionRequest, ExecutionResult};

/// Slightly under the default execution stage bound, so the tool is
/// stopped and its report stored before the engine gives up on the stage.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(870);

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);
const NO_FILTERED_OUTPUT: &str = "No filtered output available";

pub struct ToolExecutor {
    tool_path: PathBuf,
    store: Arc<dyn ArtifactStore>,
    process_timeout: Duration,
}

impl ToolExecutor {
    pub fn new(tool_path: impl Into<PathBuf>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            tool_path: tool_path.into(),
            store,
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
        }
    }

    pub fn with_process_timeout(mut self, process_timeout: Duration) -> Self {
        self.process_timeout = process_timeout;
        self
    }

    fn resolve_tool(&self) -> Result<PathBuf, ExecutionError> {
        which::which(&self.tool_path).map_err(|e| ExecutionError::ToolUnavailable {
            message: format!("{}: {}", self.tool_path.display(), e),
        })
    }

    async fn tool_version(&self, tool: &Path) -> Option<String> {
        let mut command = Command::new(tool);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        match timeout(VERSION_TIMEOUT, command.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                extract_version(&stdout).or_else(|| extract_version(&stderr))
            }
            Ok(Err(e)) => {
                warn!(event = "core.executor.version_check_failed", error = %e);
                None
            }
            Err(_) => {
                warn!(
                    event = "core.executor.version_check_failed",
                    error = "timed out"
                );
                None
            }
        }
    }

    async fn check_version(
        &self,
        tool: &Path,
        request: &ExecutionRequest,
    ) -> Result<(), ExecutorError> {
        let actual = self.tool_version(tool).await;
        let matches = actual
            .as_deref()
            .is_some_and(|v| versions_match(&request.tool_version, v));

        if matches {
            return Ok(());
        }

        let actual = actual.unwrap_or_else(|| "unknown".to_string());
        if request.enforce_version {
            error!(
                event = "core.executor.version_mismatch",
                expected = %request.tool_version,
                actual = %actual,
            );
            return Err(ExecutorError::VersionMismatch {
                expected: request.tool_version.clone(),
                actual,
            });
        }

        warn!(
            event = "core.executor.version_differs",
            expected = %request.tool_version,
            actual = %actual,
            "Version not enforced, continuing"
        );
        Ok(())
    }

    /// Store a report; a storage failure is logged and leaves no location.
    async fn store_report(&self, key: &str, body: &str) -> Option<ArtifactUri> {
        match self.store.put(key, body).await {
            Ok(uri) => Some(uri),
            Err(e) => {
                warn!(event = "core.executor.report_store_failed", key = %key, error = %e);
                None
            }
        }
    }
}

fn mode_label(dry_run: bool) -> &'static str {
    if dry_run { "dryrun" } else { "execution" }
}

#[async_trait]
impl Executor for ToolExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutorError> {
        let dry_run = request.dry_run;
        info!(
            event = "core.executor.execute_started",
            account_id = %request.account_id,
            plan = %request.plan.uri,
            dry_run = dry_run,
        );

        let tool = self.resolve_tool()?;
        self.check_version(&tool, request).await?;

        let plan_body = self.store.get(&request.plan.uri).await.map_err(|e| {
            ExecutionError::PlanUnavailable {
                message: e.to_string(),
            }
        })?;
        let plan_file = write_plan_file(&plan_body)?;

        let mut command = Command::new(&tool);
        command
            .arg("run")
            .arg("--config")
            .arg(plan_file.path())
            .arg("--no-prompt")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if !dry_run {
            command.arg("--no-dry-run");
        }

        let stamp = format!("{}-{}", key_timestamp(), request.run_id);
        let mode = mode_label(dry_run);

        let output = match timeout(self.process_timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(event = "core.executor.execute_failed", error = %e);
                return Err(ExecutionError::Io {
                    message: e.to_string(),
                }
                .into());
            }
            Err(_) => {
                let secs = self.process_timeout.as_secs();
                error!(event = "core.executor.execute_timed_out", secs = secs);
                let key = format!("{}/nuke-error-{}-timeout-{}.txt", OUTPUT_PREFIX, stamp, mode);
                let body = format!(
                    "Sweep tool timed out after {} seconds\n\nNo partial output available\n",
                    secs
                );
                let location = self.store_report(&key, &body).await;
                return Ok(ExecutionResult::failed(
                    dry_run,
                    ExecutionError::ToolTimedOut { secs },
                    location,
                ));
            }
        };

        let mut full_output = String::from_utf8_lossy(&output.stdout).into_owned();
        full_output.push_str(&String::from_utf8_lossy(&output.stderr));
        let filtered = filter_output(&full_output, dry_run);

        let full_key = format!("{}/nuke-output-{}-{}.txt", OUTPUT_PREFIX, stamp, mode);
        let filtered_key = format!("{}/nuke-filtered-{}-{}.txt", OUTPUT_PREFIX, stamp, mode);
        let full_location = self.store_report(&full_key, &full_output).await;
        let filtered_body = if filtered.report.is_empty() {
            NO_FILTERED_OUTPUT.to_string()
        } else {
            filtered.report.join("\n")
        };
        let filtered_location = self.store_report(&filtered_key, &filtered_body).await;

        // Reviewers approve from the filtered list; real runs keep the full log.
        let output_location = if dry_run {
            filtered_location
        } else {
            full_location
        };

        let resources = filtered
            .counted
            .iter()
            .map(|line| parse_resource_line(line))
            .collect();

        let mut result = if output.status.success() {
            ExecutionResult::succeeded(dry_run, resources, output_location)
        } else {
            let mut failed = ExecutionResult::failed(
                dry_run,
                ExecutionError::ToolFailed {
                    code: output.status.code(),
                },
                output_location,
            );
            failed.resources_to_delete = resources;
            failed
        };

        let withheld = result.enforce_protection(&request.protection_tag);
        if withheld > 0 {
            warn!(
                event = "core.executor.protected_resources_withheld",
                count = withheld,
                tag_key = %request.protection_tag.key,
            );
        }

        info!(
            event = "core.executor.execute_completed",
            success = result.success,
            dry_run = dry_run,
            resources = result.resources_to_delete.len(),
            exit_code = ?output.status.code(),
        );
        Ok(result)
    }
}

fn write_plan_file(body: &str) -> Result<tempfile::NamedTempFile, ExecutionError> {
    let io_error = |e: std::io::Error| ExecutionError::Io {
        message: e.to_string(),
    };
    let mut file = tempfile::Builder::new()
        .prefix("nuke-config-")
        .suffix(".yaml")
        .tempfile()
        .map_err(io_error)?;
    file.write_all(body.as_bytes()).map_err(io_error)?;
    file.flush().map_err(io_error)?;
    Ok(file)
}
