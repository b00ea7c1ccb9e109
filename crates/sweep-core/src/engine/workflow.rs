//! The workflow state machine.
//!
//! One run advances through its stages strictly in sequence. Every
//! collaborator call is bounded by its stage limit, and the whole run by
//! the overall limit. Cancellation is observed at every await point.
//! Nothing is retried: the first error moves the run to `FAILED`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sweep_config::TimeoutConfig;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::errors::WorkflowError;
use crate::engine::types::{WorkflowRun, WorkflowStage};
use crate::errors::SweepError;
use crate::executor::{ExecutionError, ExecutionRequest, Executor, ExecutorError};
use crate::invocation::Invocation;
use crate::journal::RunJournal;
use crate::lock::{AccountLease, AccountLocks};
use crate::notify::{NotificationRequest, Notifier};
use crate::plan::{ConfigGenerator, PlanRequest};
use crate::policy::{self, PolicyViolation};

pub struct WorkflowEngine {
    generator: Arc<dyn ConfigGenerator>,
    executor: Arc<dyn Executor>,
    notifier: Arc<dyn Notifier>,
    timeouts: TimeoutConfig,
    project_name: String,
    locks: Option<AccountLocks>,
    journal: Option<RunJournal>,
}

impl WorkflowEngine {
    pub fn new(
        generator: Arc<dyn ConfigGenerator>,
        executor: Arc<dyn Executor>,
        notifier: Arc<dyn Notifier>,
        timeouts: TimeoutConfig,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            executor,
            notifier,
            timeouts,
            project_name: project_name.into(),
            locks: None,
            journal: None,
        }
    }

    /// Reject a run while another run through the same `locks` holds its account.
    pub fn with_account_locks(mut self, locks: AccountLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Record every terminal run.
    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub async fn run(&self, invocation: Invocation) -> WorkflowRun {
        self.run_with_cancel(invocation, CancellationToken::new())
            .await
    }

    /// Drive one run to a terminal stage.
    ///
    /// Cancelling `token` stops the engine from advancing. Work a
    /// collaborator already started is not undone.
    pub async fn run_with_cancel(
        &self,
        invocation: Invocation,
        token: CancellationToken,
    ) -> WorkflowRun {
        let mut run = WorkflowRun::new(invocation);
        let mut lease: Option<AccountLease> = None;
        let overall = self.timeouts.overall();
        let deadline = Instant::now() + overall;

        info!(
            event = "core.engine.run_started",
            run_id = %run.id,
            account_id = %run.invocation.account_id(),
            regions = ?run.invocation.regions(),
            dry_run = run.invocation.dry_run(),
            scheduled = run.invocation.is_scheduled(),
        );

        while !run.stage.is_terminal() {
            let stage = run.stage;
            debug!(event = "core.engine.stage_started", run_id = %run.id, stage = %stage);

            let next = tokio::select! {
                biased;
                _ = token.cancelled() => Err(WorkflowError::Cancelled { stage }),
                _ = sleep_until(deadline) => Err(WorkflowError::Timeout { stage, limit: overall }),
                next = self.step(&mut run, &mut lease) => next,
            };

            match next {
                Ok(next) => {
                    if !run.advance(next) {
                        break;
                    }
                    debug!(
                        event = "core.engine.stage_completed",
                        run_id = %run.id,
                        from = %stage,
                        to = %next,
                    );
                }
                Err(e) => {
                    warn!(
                        event = "core.engine.stage_failed",
                        run_id = %run.id,
                        stage = %stage,
                        kind = e.kind(),
                        error = %e,
                    );
                    run.fail(e);
                }
            }
        }

        drop(lease);
        self.finish(&run).await;
        run
    }

    async fn step(
        &self,
        run: &mut WorkflowRun,
        lease: &mut Option<AccountLease>,
    ) -> Result<WorkflowStage, WorkflowError> {
        match run.stage {
            WorkflowStage::Validating => {
                policy::validate(&run.invocation)?;
                if let Some(locks) = &self.locks {
                    let account_id = run.invocation.account_id();
                    let acquired = locks.try_acquire(account_id).ok_or_else(|| {
                        PolicyViolation::RunInProgress {
                            account_id: account_id.to_string(),
                        }
                    })?;
                    *lease = Some(acquired);
                }
                Ok(WorkflowStage::GeneratingPlan)
            }

            WorkflowStage::GeneratingPlan => {
                let request = PlanRequest::from_invocation(
                    run.id.to_string(),
                    &run.invocation,
                    &self.project_name,
                );
                let plan = bounded(
                    WorkflowStage::GeneratingPlan,
                    self.timeouts.plan(),
                    self.generator.generate(&request),
                )
                .await??;
                run.plan = Some(plan);
                Ok(WorkflowStage::Executing)
            }

            WorkflowStage::Executing => {
                let plan = run.plan.clone().ok_or_else(|| ExecutionError::PlanUnavailable {
                    message: "no plan was generated for this run".to_string(),
                })?;
                let params = run.invocation.policy();
                let request = ExecutionRequest {
                    run_id: run.id.to_string(),
                    plan,
                    account_id: run.invocation.account_id().to_string(),
                    dry_run: run.invocation.dry_run(),
                    tool_version: params.tool_version.clone(),
                    enforce_version: params.enforce_version,
                    protection_tag: params.protection_tag.clone(),
                };

                let executed = bounded(
                    WorkflowStage::Executing,
                    self.timeouts.execution(),
                    self.executor.execute(&request),
                )
                .await?;

                let mut result = match executed {
                    Ok(result) => result,
                    Err(ExecutorError::VersionMismatch { expected, actual }) => {
                        return Err(WorkflowError::VersionMismatch { expected, actual });
                    }
                    Err(ExecutorError::Failed(e)) => return Err(e.into()),
                };

                let withheld = result.enforce_protection(&request.protection_tag);
                if withheld > 0 {
                    warn!(
                        event = "core.engine.protected_resources_withheld",
                        run_id = %run.id,
                        count = withheld,
                    );
                }

                let failure = result.failure();
                run.result = Some(result);
                match failure {
                    None => Ok(WorkflowStage::CheckingNotification),
                    Some(e) => Err(e.into()),
                }
            }

            WorkflowStage::CheckingNotification => {
                if run.invocation.send_notification() {
                    Ok(WorkflowStage::Notifying)
                } else {
                    debug!(
                        event = "core.engine.notification_skipped",
                        run_id = %run.id,
                    );
                    Ok(WorkflowStage::Completed)
                }
            }

            WorkflowStage::Notifying => {
                let request = self.notification_request(run)?;
                let receipt = bounded(
                    WorkflowStage::Notifying,
                    self.timeouts.notification(),
                    self.notifier.notify(&request),
                )
                .await??;
                run.receipt = Some(receipt);
                Ok(WorkflowStage::Completed)
            }

            WorkflowStage::Completed | WorkflowStage::Failed => Ok(run.stage),
        }
    }

    fn notification_request(&self, run: &WorkflowRun) -> Result<NotificationRequest, WorkflowError> {
        let result = run.result.as_ref().ok_or(ExecutionError::Unreported)?;
        let count = result.resources_to_delete.len();
        let outcome_summary = if result.dry_run {
            format!("{} resources found", count)
        } else {
            format!("{} resources processed", count)
        };

        Ok(NotificationRequest {
            execution_id: run.id.to_string(),
            account_id: run.invocation.account_id().to_string(),
            regions: run.invocation.regions().to_vec(),
            outcome_summary,
            output_location: result.output_location.clone(),
            resources_to_delete: result.resources_to_delete.clone(),
            success: result.success,
            dry_run: result.dry_run,
            error: result.error.as_ref().map(ToString::to_string),
            protection_tag: run.invocation.policy().protection_tag.clone(),
        })
    }

    async fn finish(&self, run: &WorkflowRun) {
        match &run.error {
            None => info!(
                event = "core.engine.run_completed",
                run_id = %run.id,
                stages = run.history.len(),
            ),
            Some(e) => error!(
                event = "core.engine.run_failed",
                run_id = %run.id,
                kind = e.kind(),
                error_code = e.error_code(),
                after_execution = e.after_execution(),
                error = %e,
            ),
        }

        let (Some(journal), Some(outcome)) = (&self.journal, run.outcome()) else {
            return;
        };
        if let Err(e) = journal.record(&outcome).await {
            warn!(
                event = "core.engine.journal_failed",
                run_id = %run.id,
                error = %e,
            );
        }
    }
}

async fn bounded<T>(
    stage: WorkflowStage,
    limit: Duration,
    work: impl Future<Output = T>,
) -> Result<T, WorkflowError> {
    timeout(limit, work)
        .await
        .map_err(|_| WorkflowError::Timeout { stage, limit })
}
