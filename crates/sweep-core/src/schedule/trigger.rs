//! Periodic, pre-approved runs.

use std::sync::Arc;

use chrono::Utc;
use sweep_config::SweepConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::artifacts::Housekeeping;
use crate::engine::{WorkflowEngine, WorkflowRun};
use crate::invocation::{Invocation, PolicyParams};
use crate::schedule::errors::ScheduleError;
use crate::schedule::expression::ScheduleExpression;

/// Fires scheduled invocations into the engine.
///
/// Every invocation it builds comes from [`Invocation::scheduled`]: the
/// environment's account, every allowed region, no dry run and no
/// notification. The policy guard still validates each one.
pub struct ScheduleTrigger {
    expression: ScheduleExpression,
    account_id: String,
    policy: Arc<PolicyParams>,
    engine: Arc<WorkflowEngine>,
    housekeeping: Option<Housekeeping>,
}

impl ScheduleTrigger {
    /// Build the trigger, or `None` when the configured expression is `manual`.
    pub fn from_config(
        config: &SweepConfig,
        engine: Arc<WorkflowEngine>,
    ) -> Result<Option<Self>, ScheduleError> {
        let expression = ScheduleExpression::parse(&config.schedule_expression)?;
        if expression.is_manual() {
            info!(
                event = "core.schedule.rule_not_registered",
                reason = "manual schedule expression",
            );
            return Ok(None);
        }
        let account_id = config
            .account_id
            .clone()
            .ok_or(ScheduleError::MissingAccount)?;

        info!(
            event = "core.schedule.rule_registered",
            expression = %config.schedule_expression,
            account_id = %account_id,
        );
        Ok(Some(Self {
            expression,
            account_id,
            policy: Arc::new(PolicyParams::from_config(config)),
            engine,
            housekeeping: None,
        }))
    }

    /// Apply artifact retention after every fire.
    pub fn with_housekeeping(mut self, housekeeping: Housekeeping) -> Self {
        self.housekeeping = Some(housekeeping);
        self
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::scheduled(self.account_id.clone(), Arc::clone(&self.policy))
    }

    /// Run one scheduled cycle now.
    pub async fn fire(&self, token: &CancellationToken) -> WorkflowRun {
        let run = self
            .engine
            .run_with_cancel(self.invocation(), token.child_token())
            .await;

        match run.error.as_ref() {
            None => info!(
                event = "core.schedule.fire_completed",
                run_id = %run.id,
            ),
            Some(e) => warn!(
                event = "core.schedule.fire_failed",
                run_id = %run.id,
                kind = e.kind(),
                error = %e,
            ),
        }

        if let Some(housekeeping) = &self.housekeeping {
            let removed = housekeeping.sweep().await;
            info!(event = "core.schedule.retention_completed", removed = removed);
        }
        run
    }

    /// Fire on schedule until `token` is cancelled. Returns the number of fires.
    ///
    /// Fires never overlap: the next delay is computed after the previous
    /// run has finished.
    pub async fn run(&self, token: CancellationToken) -> usize {
        let mut fires = 0;
        loop {
            let Some(delay) = self.expression.next_delay(Utc::now()) else {
                info!(event = "core.schedule.exhausted");
                break;
            };
            info!(
                event = "core.schedule.next_fire",
                delay_secs = delay.as_secs(),
            );

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            self.fire(&token).await;
            fires += 1;
            if token.is_cancelled() {
                break;
            }
        }
        info!(event = "core.schedule.stopped", fires = fires);
        fires
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sweep_config::TimeoutConfig;

    use crate::engine::RunStatus;
    use crate::engine::test_support::{FakeExecutor, FakeGenerator, FakeNotifier};

    struct Setup {
        executor: Arc<FakeExecutor>,
        notifier: Arc<FakeNotifier>,
        engine: Arc<WorkflowEngine>,
    }

    fn setup() -> Setup {
        let executor = Arc::new(FakeExecutor::succeeding(2));
        let notifier = Arc::new(FakeNotifier::default());
        let engine = Arc::new(WorkflowEngine::new(
            Arc::new(FakeGenerator::default()),
            executor.clone(),
            notifier.clone(),
            TimeoutConfig::default(),
            "aws-nuke",
        ));
        Setup {
            executor,
            notifier,
            engine,
        }
    }

    fn config(expression: &str, account_id: Option<&str>) -> SweepConfig {
        SweepConfig {
            schedule_expression: expression.to_string(),
            account_id: account_id.map(str::to_string),
            allowed_regions: vec!["eu-west-1".to_string(), "eu-west-2".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_manual_registers_nothing() {
        let setup = setup();
        let trigger = ScheduleTrigger::from_config(&config("manual", Some("111")), setup.engine);
        assert!(trigger.unwrap().is_none());
    }

    #[test]
    fn test_schedule_needs_account() {
        let setup = setup();
        let result = ScheduleTrigger::from_config(&config("rate(1 hour)", None), setup.engine);
        assert!(matches!(result, Err(ScheduleError::MissingAccount)));
    }

    #[test]
    fn test_invocation_has_fixed_safe_defaults() {
        let setup = setup();
        let trigger = ScheduleTrigger::from_config(&config("rate(1 hour)", Some("111")), setup.engine)
            .unwrap()
            .unwrap();

        let invocation = trigger.invocation();
        assert_eq!(invocation.account_id(), "111");
        assert_eq!(invocation.regions(), ["eu-west-1", "eu-west-2"]);
        assert!(!invocation.dry_run());
        assert!(!invocation.send_notification());
        assert!(invocation.is_scheduled());
    }

    #[tokio::test]
    async fn test_blocklisted_environment_account_still_rejected() {
        let setup = setup();
        let mut cfg = config("rate(1 hour)", Some("999"));
        cfg.blocklist_accounts = vec!["999".to_string()];
        let trigger = ScheduleTrigger::from_config(&cfg, setup.engine).unwrap().unwrap();

        let run = trigger.fire(&CancellationToken::new()).await;
        assert_eq!(run.status(), Some(RunStatus::Failed));
        assert_eq!(run.error.unwrap().kind(), "BlockedAccount");
        assert_eq!(setup.executor.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fires_on_rate_until_cancelled() {
        let setup = setup();
        let trigger = ScheduleTrigger::from_config(&config("rate(1 minute)", Some("111")), setup.engine)
            .unwrap()
            .unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(150)).await;
            canceller.cancel();
        });

        let fires = trigger.run(token).await;
        assert_eq!(fires, 2);
        assert_eq!(setup.executor.calls(), 2);
        assert_eq!(setup.notifier.calls(), 0);
        let request = setup.executor.last_request().unwrap();
        assert!(!request.dry_run);
    }
}
