use std::error::Error;

pub use sweep_config::ConfigError;

/// Base trait for all application errors
pub trait SweepError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type SweepResult<T> = Result<T, Box<dyn SweepError>>;

impl SweepError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(self, ConfigError::IoError { .. })
    }
}

/// Log an application error at the level its classification calls for.
pub fn log_app_error<E: SweepError>(error: &E) {
    if error.is_user_error() {
        tracing::warn!(
            event = "core.errors.user_error",
            error_code = error.error_code(),
            error = %error,
        );
    } else {
        tracing::error!(
            event = "core.errors.app_error",
            error_code = error.error_code(),
            error = %error,
        );
    }
}
