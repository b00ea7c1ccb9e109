use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("sweep")
        .about("Safety-gated cleanup runs across cloud accounts")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML override file (default: ./sweep.toml when present)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("run")
                .about("Run one cleanup cycle for an account")
                .arg(account_arg())
                .arg(region_arg())
                .arg(
                    Arg::new("input")
                        .long("input")
                        .help("Invocation JSON file ({\"accountId\", \"regions\", \"dryRun\", \"sendNotification\"})")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Report what would be deleted without deleting (default)")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-dry-run"),
                )
                .arg(
                    Arg::new("no-dry-run")
                        .long("no-dry-run")
                        .help("Delete resources. Use only after reviewing a dry run")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("notify")
                        .long("notify")
                        .help("Send a notification when the run finishes (default)")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-notify"),
                )
                .arg(
                    Arg::new("no-notify")
                        .long("no-notify")
                        .help("Skip the notification")
                        .action(ArgAction::SetTrue),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("schedule")
                .about("Fire scheduled runs until interrupted")
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Fire one scheduled run now and exit")
                        .action(ArgAction::SetTrue),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Check an account and regions against the policy without running")
                .arg(account_arg().required(true))
                .arg(region_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("config")
                .about("Print the resolved configuration")
                .arg(json_arg()),
        )
}

fn account_arg() -> Arg {
    Arg::new("account")
        .short('a')
        .long("account")
        .help("Target account id")
}

fn region_arg() -> Arg {
    Arg::new("region")
        .short('r')
        .long("region")
        .help("Region to clean; repeat or comma-separate for several")
        .action(ArgAction::Append)
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_run_collects_regions() {
        let matches = build_cli()
            .try_get_matches_from([
                "sweep", "run", "--account", "111", "-r", "eu-west-1", "-r", "eu-west-2",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "run");
        let regions: Vec<&String> = sub.get_many::<String>("region").unwrap().collect();
        assert_eq!(regions, ["eu-west-1", "eu-west-2"]);
        assert!(!sub.get_flag("no-dry-run"));
    }

    #[test]
    fn test_dry_run_flags_conflict() {
        let result = build_cli().try_get_matches_from([
            "sweep",
            "run",
            "--account",
            "111",
            "--dry-run",
            "--no-dry-run",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_account() {
        let result = build_cli().try_get_matches_from(["sweep", "validate", "-r", "eu-west-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["sweep", "config", "-v", "--config", "custom.toml"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("custom.toml"))
        );
    }
}
