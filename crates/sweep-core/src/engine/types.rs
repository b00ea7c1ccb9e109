use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::errors::WorkflowError;
use crate::errors::SweepError;
use crate::executor::ExecutionResult;
use crate::invocation::Invocation;
use crate::notify::DeliveryReceipt;
use crate::plan::PlanArtifact;

/// Stage of a workflow run.
///
/// `Completed` and `Failed` are terminal. `Failed` is reachable from every
/// non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
    Validating,
    GeneratingPlan,
    Executing,
    CheckingNotification,
    Notifying,
    Completed,
    Failed,
}

impl WorkflowStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStage::Completed | WorkflowStage::Failed)
    }

    /// Stages reachable in one transition.
    pub fn successors(self) -> &'static [WorkflowStage] {
        use crate::engine::types::WorkflowStage::*;
        match self {
            Validating => &[GeneratingPlan, Failed],
            GeneratingPlan => &[Executing, Failed],
            Executing => &[CheckingNotification, Failed],
            CheckingNotification => &[Notifying, Completed, Failed],
            Notifying => &[Completed, Failed],
            Completed | Failed => &[],
        }
    }

    pub fn can_transition_to(self, next: WorkflowStage) -> bool {
        self.successors().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Validating => "VALIDATING",
            WorkflowStage::GeneratingPlan => "GENERATING_PLAN",
            WorkflowStage::Executing => "EXECUTING",
            WorkflowStage::CheckingNotification => "CHECKING_NOTIFICATION",
            WorkflowStage::Notifying => "NOTIFYING",
            WorkflowStage::Completed => "COMPLETED",
            WorkflowStage::Failed => "FAILED",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Bookkeeping for one run, owned and advanced only by the engine.
#[derive(Debug)]
pub struct WorkflowRun {
    pub id: RunId,
    pub stage: WorkflowStage,
    pub invocation: Invocation,
    pub plan: Option<PlanArtifact>,
    pub result: Option<ExecutionResult>,
    pub receipt: Option<DeliveryReceipt>,
    pub error: Option<WorkflowError>,
    /// Every stage visited, in order, starting with `Validating`.
    pub history: Vec<WorkflowStage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(invocation: Invocation) -> Self {
        Self {
            id: RunId::new(),
            stage: WorkflowStage::Validating,
            invocation,
            plan: None,
            result: None,
            receipt: None,
            error: None,
            history: vec![WorkflowStage::Validating],
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `next`. Transitions outside the table are ignored and
    /// reported as `false`.
    pub(crate) fn advance(&mut self, next: WorkflowStage) -> bool {
        if !self.stage.can_transition_to(next) {
            tracing::error!(
                event = "core.engine.transition_rejected",
                run_id = %self.id,
                from = %self.stage,
                to = %next,
            );
            return false;
        }
        self.stage = next;
        self.history.push(next);
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    pub(crate) fn fail(&mut self, error: WorkflowError) {
        if self.advance(WorkflowStage::Failed) {
            self.error = Some(error);
        }
    }

    pub fn status(&self) -> Option<RunStatus> {
        match self.stage {
            WorkflowStage::Completed => Some(RunStatus::Completed),
            WorkflowStage::Failed => Some(RunStatus::Failed),
            _ => None,
        }
    }

    /// Serializable terminal view of the run; `None` until the run ends.
    pub fn outcome(&self) -> Option<Outcome> {
        Some(Outcome {
            run_id: self.id,
            status: self.status()?,
            account_id: self.invocation.account_id().to_string(),
            regions: self.invocation.regions().to_vec(),
            dry_run: self.invocation.dry_run(),
            scheduled: self.invocation.is_scheduled(),
            error: self.error.as_ref().map(ErrorRecord::from),
            history: self.history.clone(),
            plan: self.plan.clone(),
            result: self.result.clone(),
            receipt: self.receipt.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or(self.started_at),
        })
    }
}

/// Terminal outcome exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub run_id: RunId,
    pub status: RunStatus,
    pub account_id: String,
    pub regions: Vec<String>,
    pub dry_run: bool,
    pub scheduled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    pub history: Vec<WorkflowStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanArtifact>,
    /// Present whenever execution produced a result, including runs that
    /// failed afterwards while notifying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<DeliveryReceipt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub code: String,
    pub message: String,
}

impl From<&WorkflowError> for ErrorRecord {
    fn from(error: &WorkflowError) -> Self {
        Self {
            kind: error.kind().to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::invocation::{InvocationRequest, PolicyParams};
    use crate::policy::PolicyViolation;
    use sweep_config::SweepConfig;

    fn run() -> WorkflowRun {
        let policy = Arc::new(PolicyParams::from_config(&SweepConfig::default()));
        WorkflowRun::new(Invocation::manual(
            InvocationRequest {
                account_id: "111".to_string(),
                regions: vec!["eu-west-1".to_string()],
                dry_run: true,
                send_notification: true,
                scheduled: None,
            },
            policy,
        ))
    }

    #[test]
    fn test_failed_reachable_from_every_non_terminal_stage() {
        use crate::engine::types::WorkflowStage::*;
        for stage in [Validating, GeneratingPlan, Executing, CheckingNotification, Notifying] {
            assert!(stage.can_transition_to(Failed), "{} -> FAILED", stage);
            assert!(!stage.is_terminal());
        }
        assert!(Completed.successors().is_empty());
        assert!(Failed.successors().is_empty());
    }

    #[test]
    fn test_notification_check_may_skip_notifier() {
        use crate::engine::types::WorkflowStage::*;
        assert!(CheckingNotification.can_transition_to(Completed));
        assert!(!Executing.can_transition_to(Completed));
        assert!(!Validating.can_transition_to(Executing));
    }

    #[test]
    fn test_terminal_stage_cannot_be_left() {
        let mut run = run();
        run.fail(WorkflowError::from(PolicyViolation::NoRegionsSpecified));
        assert_eq!(run.stage, WorkflowStage::Failed);
        assert!(!run.advance(WorkflowStage::GeneratingPlan));
        assert_eq!(run.history, [WorkflowStage::Validating, WorkflowStage::Failed]);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_outcome_only_for_terminal_runs() {
        let mut run = run();
        assert!(run.outcome().is_none());

        run.fail(WorkflowError::from(PolicyViolation::BlockedAccount {
            account_id: "111".to_string(),
        }));
        let outcome = run.outcome().unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["error"]["kind"], "BlockedAccount");
        assert_eq!(json["error"]["code"], "POLICY_BLOCKED_ACCOUNT");
        assert_eq!(json["history"][1], "FAILED");
        assert!(json.get("plan").is_none());
    }
}
