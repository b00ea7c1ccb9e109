use std::time::Duration;

use crate::engine::types::WorkflowStage;
use crate::errors::SweepError;
use crate::executor::ExecutionError;
use crate::notify::DeliveryError;
use crate::plan::GenerationError;
use crate::policy::PolicyViolation;

/// The single error attached to a failed run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Policy violation: {0}")]
    Policy(#[from] PolicyViolation),

    #[error("Plan generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Tool version mismatch: expected {expected}, found {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Notification failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("{stage} exceeded its time limit of {}s", .limit.as_secs())]
    Timeout { stage: WorkflowStage, limit: Duration },

    #[error("Run cancelled during {stage}")]
    Cancelled { stage: WorkflowStage },
}

impl WorkflowError {
    /// Error kind as reported in run outcomes. Policy violations report
    /// the specific rule that failed.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Policy(violation) => violation.kind(),
            WorkflowError::Generation(_) => "GenerationError",
            WorkflowError::VersionMismatch { .. } => "VersionMismatch",
            WorkflowError::Execution(_) => "ExecutionError",
            WorkflowError::Delivery(_) => "DeliveryError",
            WorkflowError::Timeout { .. } => "Timeout",
            WorkflowError::Cancelled { .. } => "Cancelled",
        }
    }

    /// True when the sweep tool may already have run, so a failed run
    /// cannot be read as "nothing was deleted".
    pub fn after_execution(&self) -> bool {
        match self {
            WorkflowError::Execution(inner) => !matches!(
                inner,
                ExecutionError::ToolUnavailable { .. } | ExecutionError::PlanUnavailable { .. }
            ),
            WorkflowError::Delivery(_) => true,
            WorkflowError::Timeout { stage, .. } | WorkflowError::Cancelled { stage } => matches!(
                stage,
                WorkflowStage::Executing
                    | WorkflowStage::CheckingNotification
                    | WorkflowStage::Notifying
            ),
            WorkflowError::Policy(_)
            | WorkflowError::Generation(_)
            | WorkflowError::VersionMismatch { .. } => false,
        }
    }
}

impl SweepError for WorkflowError {
    fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::Policy(inner) => inner.error_code(),
            WorkflowError::Generation(inner) => inner.error_code(),
            WorkflowError::VersionMismatch { .. } => "EXECUTOR_VERSION_MISMATCH",
            WorkflowError::Execution(inner) => inner.error_code(),
            WorkflowError::Delivery(inner) => inner.error_code(),
            WorkflowError::Timeout { .. } => "WORKFLOW_TIMEOUT",
            WorkflowError::Cancelled { .. } => "WORKFLOW_CANCELLED",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            WorkflowError::Policy(_) | WorkflowError::VersionMismatch { .. } => true,
            WorkflowError::Cancelled { .. } => true,
            WorkflowError::Execution(inner) => inner.is_user_error(),
            WorkflowError::Delivery(inner) => inner.is_user_error(),
            WorkflowError::Generation(_) | WorkflowError::Timeout { .. } => false,
        }
    }
}
