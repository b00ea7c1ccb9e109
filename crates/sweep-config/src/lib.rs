//! Static configuration for sweep.
//!
//! Values resolve in priority order: explicit override (TOML file or CLI
//! flag), then `SWEEP_*` environment variables, then documented defaults.

pub mod errors;
pub mod loading;
pub mod resolver;
pub mod types;

pub use errors::ConfigError;
pub use loading::{DEFAULT_CONFIG_FILE, load_overrides};
pub use resolver::Resolver;
pub use types::{
    ConfigOverrides, MANUAL_SCHEDULE, SweepConfig, TimeoutConfig, TimeoutOverrides,
};
