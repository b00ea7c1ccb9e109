use std::sync::Arc;

use clap::ArgMatches;
use serde_json::json;
use sweep_core::{Invocation, InvocationRequest, PolicyParams};
use tracing::{error, info};

use super::helpers;

pub(crate) fn handle_validate_command(
    root: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = helpers::load_config(root)?;
    let account_id = matches
        .get_one::<String>("account")
        .ok_or("Account is required")?;

    let request = InvocationRequest {
        account_id: account_id.clone(),
        regions: helpers::regions_from_matches(matches),
        dry_run: true,
        send_notification: false,
        scheduled: None,
    };
    info!(
        event = "cli.validate_started",
        account_id = %request.account_id,
        regions = ?request.regions,
    );

    let invocation = Invocation::manual(request, Arc::new(PolicyParams::from_config(&config)));

    match sweep_core::policy::validate(&invocation) {
        Ok(()) => {
            if json_output {
                let report = json!({
                    "accountId": invocation.account_id(),
                    "regions": invocation.regions(),
                    "valid": true,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Account {} may run in {}",
                    invocation.account_id(),
                    invocation.regions().join(", ")
                );
            }
            info!(event = "cli.validate_completed", account_id = %invocation.account_id());
            Ok(())
        }
        Err(violation) => {
            if json_output {
                let report = json!({
                    "accountId": invocation.account_id(),
                    "regions": invocation.regions(),
                    "valid": false,
                    "violation": violation,
                    "message": violation.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                eprintln!("Rejected: {}", violation);
            }
            error!(
                event = "cli.validate_failed",
                violation = violation.kind(),
                error = %violation,
            );
            sweep_core::log_app_error(&violation);
            Err(violation.into())
        }
    }
}
