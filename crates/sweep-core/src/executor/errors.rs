use serde::{Deserialize, Serialize};

use crate::errors::SweepError;

/// Failure of the sweep itself, attached to an [`ExecutionResult`].
///
/// Deletions may already have happened when one of these is reported;
/// nothing is rolled back.
///
/// [`ExecutionResult`]: crate::executor::ExecutionResult
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExecutionError {
    #[error("Sweep tool exited with code {}", exit_code(.code))]
    ToolFailed { code: Option<i32> },

    #[error("Sweep tool timed out after {secs} seconds")]
    ToolTimedOut { secs: u64 },

    #[error("Sweep tool unavailable: {message}")]
    ToolUnavailable { message: String },

    #[error("Plan could not be loaded: {message}")]
    PlanUnavailable { message: String },

    #[error("IO error while running sweep tool: {message}")]
    Io { message: String },

    #[error("Executor reported failure without an error")]
    Unreported,
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

impl SweepError for ExecutionError {
    fn error_code(&self) -> &'static str {
        match self {
            ExecutionError::ToolFailed { .. } => "EXECUTOR_TOOL_FAILED",
            ExecutionError::ToolTimedOut { .. } => "EXECUTOR_TOOL_TIMED_OUT",
            ExecutionError::ToolUnavailable { .. } => "EXECUTOR_TOOL_UNAVAILABLE",
            ExecutionError::PlanUnavailable { .. } => "EXECUTOR_PLAN_UNAVAILABLE",
            ExecutionError::Io { .. } => "EXECUTOR_IO_ERROR",
            ExecutionError::Unreported => "EXECUTOR_UNREPORTED_FAILURE",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, ExecutionError::ToolUnavailable { .. })
    }
}

/// Errors raised before the executor could produce a result.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Tool version mismatch: expected {expected}, found {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error(transparent)]
    Failed(#[from] ExecutionError),
}

impl SweepError for ExecutorError {
    fn error_code(&self) -> &'static str {
        match self {
            ExecutorError::VersionMismatch { .. } => "EXECUTOR_VERSION_MISMATCH",
            ExecutorError::Failed(inner) => inner.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            ExecutorError::VersionMismatch { .. } => true,
            ExecutorError::Failed(inner) => inner.is_user_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_display() {
        let error = ExecutionError::ToolFailed { code: Some(2) };
        assert_eq!(error.to_string(), "Sweep tool exited with code 2");

        let error = ExecutionError::ToolFailed { code: None };
        assert_eq!(error.to_string(), "Sweep tool exited with code unknown");
    }

    #[test]
    fn test_version_mismatch_is_user_error() {
        let error = ExecutorError::VersionMismatch {
            expected: "v3.62.2".to_string(),
            actual: "v3.50.0".to_string(),
        };
        assert_eq!(error.error_code(), "EXECUTOR_VERSION_MISMATCH");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_failed_delegates_code() {
        let error = ExecutorError::from(ExecutionError::ToolTimedOut { secs: 870 });
        assert_eq!(error.error_code(), "EXECUTOR_TOOL_TIMED_OUT");
        assert_eq!(error.to_string(), "Sweep tool timed out after 870 seconds");
    }

    #[test]
    fn test_execution_error_serializes_with_reason() {
        let json = serde_json::to_value(ExecutionError::ToolFailed { code: Some(1) }).unwrap();
        assert_eq!(json["reason"], "tool_failed");
        assert_eq!(json["code"], 1);
    }
}
