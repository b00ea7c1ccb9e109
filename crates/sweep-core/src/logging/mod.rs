//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

const QUIET_FILTER: &str = "sweep=warn,sweep_core=warn,sweep_config=warn";
const VERBOSE_FILTER: &str = "sweep=info,sweep_core=info,sweep_config=info";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the quiet/verbose default. Setting
/// `SWEEP_LOG_FORMAT=json` switches to one JSON object per line. Logs go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_logging(quiet: bool) {
    let default_filter = if quiet { QUIET_FILTER } else { VERBOSE_FILTER };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json_requested() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        // A subscriber is already installed (tests, embedding callers).
        tracing::debug!(event = "core.logging.init_skipped", error = %e);
    }
}

fn json_requested() -> bool {
    std::env::var("SWEEP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"))
}
