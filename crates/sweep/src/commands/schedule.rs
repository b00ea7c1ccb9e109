use std::sync::Arc;

use clap::ArgMatches;
use sweep_core::{RunStatus, ScheduleTrigger};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::helpers;
use crate::shutdown::wait_for_shutdown_signal;

pub(crate) fn handle_schedule_command(
    root: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let once = matches.get_flag("once");
    let json_output = matches.get_flag("json");
    let config = helpers::load_config(root)?;

    info!(
        event = "cli.schedule_started",
        expression = %config.schedule_expression,
        once = once,
    );

    let store = helpers::artifact_store(&config);
    let engine = Arc::new(helpers::build_engine(&config, Arc::clone(&store)));

    let trigger = match ScheduleTrigger::from_config(&config, engine) {
        Ok(Some(trigger)) => trigger.with_housekeeping(helpers::housekeeping(&config, store)),
        Ok(None) => {
            println!(
                "Schedule expression is '{}'; no scheduled runs are registered.",
                config.schedule_expression
            );
            info!(event = "cli.schedule_completed", fires = 0);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Cannot start scheduler: {}", e);
            error!(event = "cli.schedule_failed", error = %e);
            sweep_core::log_app_error(&e);
            return Err(e.into());
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;

    if once {
        let run = runtime.block_on(async {
            let token = CancellationToken::new();
            let signals = tokio::spawn(wait_for_shutdown_signal(token.clone()));
            let run = trigger.fire(&token).await;
            token.cancel();
            let _ = signals.await;
            run
        });

        let outcome = run
            .outcome()
            .ok_or_else(|| format!("Run {} ended in non-terminal stage {}", run.id, run.stage))?;
        helpers::print_outcome(&outcome, json_output)?;
        info!(event = "cli.schedule_completed", fires = 1);
        return match outcome.status {
            RunStatus::Completed => Ok(()),
            RunStatus::Failed => Err(format!("Scheduled run {} failed", outcome.run_id).into()),
        };
    }

    if !json_output {
        println!(
            "Scheduler running with '{}' for account {}. Press Ctrl-C to stop.",
            config.schedule_expression,
            trigger.invocation().account_id()
        );
    }
    let fires = runtime.block_on(async {
        let token = CancellationToken::new();
        let signals = tokio::spawn(wait_for_shutdown_signal(token.clone()));
        let fires = trigger.run(token.clone()).await;
        token.cancel();
        let _ = signals.await;
        fires
    });

    info!(event = "cli.schedule_completed", fires = fires);
    Ok(())
}
