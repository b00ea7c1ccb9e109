use clap::ArgMatches;
use tracing::info;

use super::helpers;

pub(crate) fn handle_config_command(
    root: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    info!(event = "cli.config_started", json_output = json_output);

    let config = helpers::load_config(root)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
        println!("# artifact bucket: {}", config.artifact_bucket());
    }

    info!(event = "cli.config_completed");
    Ok(())
}
