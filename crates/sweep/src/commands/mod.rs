use clap::ArgMatches;
use tracing::error;

mod config;
mod helpers;
mod run;
mod schedule;
mod validate;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("run", sub_matches)) => run::handle_run_command(matches, sub_matches),
        Some(("schedule", sub_matches)) => schedule::handle_schedule_command(matches, sub_matches),
        Some(("validate", sub_matches)) => validate::handle_validate_command(matches, sub_matches),
        Some(("config", sub_matches)) => config::handle_config_command(matches, sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
