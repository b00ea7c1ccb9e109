use std::sync::Arc;

use clap::ArgMatches;
use sweep_core::{Invocation, PolicyParams, RunStatus};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::helpers;
use crate::shutdown::wait_for_shutdown_signal;

pub(crate) fn handle_run_command(
    root: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = helpers::load_config(root)?;
    let request = helpers::invocation_request(matches)?;

    info!(
        event = "cli.run_started",
        account_id = %request.account_id,
        regions = ?request.regions,
        dry_run = request.dry_run,
        send_notification = request.send_notification,
    );

    let invocation = Invocation::manual(request, Arc::new(PolicyParams::from_config(&config)));
    let store = helpers::artifact_store(&config);
    let engine = helpers::build_engine(&config, store);

    let runtime = tokio::runtime::Runtime::new()?;
    let run = runtime.block_on(async {
        let token = CancellationToken::new();
        let signals = tokio::spawn(wait_for_shutdown_signal(token.clone()));
        let run = engine.run_with_cancel(invocation, token.clone()).await;
        // Stop the signal listener once the run is over.
        token.cancel();
        let _ = signals.await;
        run
    });

    let Some(outcome) = run.outcome() else {
        error!(event = "cli.run_failed", run_id = %run.id, stage = %run.stage);
        return Err(format!("Run {} ended in non-terminal stage {}", run.id, run.stage).into());
    };
    helpers::print_outcome(&outcome, json_output)?;

    if let Some(e) = run.error {
        if !json_output {
            eprintln!("Run failed: {}", e);
        }
        error!(
            event = "cli.run_failed",
            run_id = %outcome.run_id,
            kind = e.kind(),
            error = %e,
        );
        sweep_core::log_app_error(&e);
        return Err(e.into());
    }
    if outcome.status == RunStatus::Failed {
        error!(event = "cli.run_failed", run_id = %outcome.run_id);
        return Err(format!("Run {} failed", outcome.run_id).into());
    }

    info!(event = "cli.run_completed", run_id = %outcome.run_id);
    Ok(())
}
