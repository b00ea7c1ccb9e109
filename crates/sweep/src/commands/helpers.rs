use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use sweep_config::{SweepConfig, load_overrides};
use sweep_core::{
    AccountLocks, ArtifactStore, DeliveryRegistry, Housekeeping, InvocationRequest,
    LocalArtifactStore, NukePlanGenerator, Outcome, RegistryNotifier, RunJournal, RunStatus,
    ToolExecutor, WorkflowEngine,
};
use tracing::{error, info};

/// Resolve configuration from `--config`, the environment and defaults.
pub fn load_config(root: &ArgMatches) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    let explicit = root.get_one::<PathBuf>("config");
    let overrides = load_overrides(explicit.map(PathBuf::as_path)).inspect_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        error!(event = "cli.config_load_failed", error = %e);
        sweep_core::log_app_error(e);
    })?;

    match SweepConfig::load(&overrides) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            error!(event = "cli.config_load_failed", error = %e);
            sweep_core::log_app_error(&e);
            Err(e.into())
        }
    }
}

pub fn artifact_store(config: &SweepConfig) -> Arc<dyn ArtifactStore> {
    Arc::new(LocalArtifactStore::new(
        config.artifact_dir.clone(),
        config.artifact_bucket(),
    ))
}

/// Wire the production collaborators into an engine.
pub fn build_engine(config: &SweepConfig, store: Arc<dyn ArtifactStore>) -> WorkflowEngine {
    let generator = NukePlanGenerator::new(Arc::clone(&store), config.cdk_bucket_prefix.clone());
    let executor = ToolExecutor::new(config.tool_path.clone(), Arc::clone(&store))
        .with_process_timeout(process_timeout(config.timeouts.execution()));
    let registry = DeliveryRegistry::standard(
        config.notification_address.as_deref(),
        &config.artifact_dir,
    );
    info!(
        event = "cli.engine_built",
        bucket = store.bucket(),
        backends = ?registry.backend_names(),
    );

    let engine = WorkflowEngine::new(
        Arc::new(generator),
        Arc::new(executor),
        Arc::new(RegistryNotifier::new(registry)),
        config.timeouts,
        config.project_name.clone(),
    )
    .with_journal(RunJournal::new(store));

    if config.exclusive_runs {
        engine.with_account_locks(AccountLocks::new())
    } else {
        engine
    }
}

pub fn housekeeping(config: &SweepConfig, store: Arc<dyn ArtifactStore>) -> Housekeeping {
    Housekeeping::new(
        store,
        config.artifact_retention_days,
        config.log_retention_days,
    )
}

/// Leave the child process a margin inside the execution stage limit so it
/// is stopped and reported before the stage itself times out.
pub fn process_timeout(stage_limit: Duration) -> Duration {
    stage_limit.saturating_sub(stage_limit / 30)
}

/// Regions from repeated or comma-separated `--region` flags.
pub fn regions_from_matches(matches: &ArgMatches) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for raw in matches.get_many::<String>("region").into_iter().flatten() {
        for region in sweep_config::resolver::split_list(raw) {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
    }
    regions
}

/// Build a manual request from `--input` or from flags.
///
/// Flags given alongside `--input` take precedence over the file.
pub fn invocation_request(
    matches: &ArgMatches,
) -> Result<InvocationRequest, Box<dyn std::error::Error>> {
    let mut request = match matches.get_one::<PathBuf>("input") {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
            serde_json::from_str::<InvocationRequest>(&content)
                .map_err(|e| format!("Invalid invocation in '{}': {}", path.display(), e))?
        }
        None => {
            let account_id = matches
                .get_one::<String>("account")
                .ok_or("Either --account or --input is required")?;
            InvocationRequest {
                account_id: account_id.clone(),
                regions: Vec::new(),
                dry_run: true,
                send_notification: true,
                scheduled: None,
            }
        }
    };

    if let Some(account_id) = matches.get_one::<String>("account") {
        request.account_id = account_id.clone();
    }
    let regions = regions_from_matches(matches);
    if !regions.is_empty() {
        request.regions = regions;
    }
    if matches.get_flag("no-dry-run") {
        request.dry_run = false;
    } else if matches.get_flag("dry-run") {
        request.dry_run = true;
    }
    if matches.get_flag("no-notify") {
        request.send_notification = false;
    } else if matches.get_flag("notify") {
        request.send_notification = true;
    }
    Ok(request)
}

pub fn print_outcome(outcome: &Outcome, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    write_outcome(&mut std::io::stdout().lock(), outcome, json_output)
}

fn write_outcome(
    out: &mut impl Write,
    outcome: &Outcome,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?;
        return Ok(());
    }

    let mode = if outcome.dry_run { "dry run" } else { "execution" };
    match outcome.status {
        RunStatus::Completed => writeln!(out, "Run {} completed ({})", outcome.run_id, mode)?,
        RunStatus::Failed => writeln!(out, "Run {} failed ({})", outcome.run_id, mode)?,
    }
    writeln!(out, "  Account:  {}", outcome.account_id)?;
    writeln!(out, "  Regions:  {}", outcome.regions.join(", "))?;
    let stages: Vec<&str> = outcome.history.iter().map(|s| s.as_str()).collect();
    writeln!(out, "  Stages:   {}", stages.join(" -> "))?;
    if let Some(plan) = &outcome.plan {
        writeln!(out, "  Plan:     {}", plan.uri)?;
    }
    if let Some(result) = &outcome.result {
        writeln!(out, "  Resources: {}", result.resources_to_delete.len())?;
        if !result.protected.is_empty() {
            writeln!(out, "  Protected: {}", result.protected.len())?;
        }
        if let Some(location) = &result.output_location {
            writeln!(out, "  Output:   {}", location)?;
        }
    }
    if let Some(receipt) = &outcome.receipt {
        writeln!(out, "  Notified: {} ({})", receipt.backend, receipt.message_id)?;
    }
    if let Some(e) = &outcome.error {
        writeln!(out, "  Error:    [{}] {}", e.kind, e.message)?;
    }
    Ok(())
}
