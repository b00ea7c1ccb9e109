use std::error::Error;

#[derive(Debug)]
pub enum ConfigError {
    ConfigNotFound {
        path: String,
    },
    ConfigParseError {
        message: String,
    },
    InvalidValue {
        source_name: String,
        key: String,
        value: String,
        expected: &'static str,
    },
    InvalidConfiguration {
        message: String,
    },
    IoError {
        source: std::io::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound { path } => {
                write!(f, "Config file not found at '{}'", path)
            }
            ConfigError::ConfigParseError { message } => {
                write!(f, "Failed to parse config file: {}", message)
            }
            ConfigError::InvalidValue {
                source_name,
                key,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for {} (from {}): expected {}",
                    value, key, source_name, expected
                )
            }
            ConfigError::InvalidConfiguration { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            ConfigError::IoError { source } => {
                write!(f, "IO error reading config: {}", source)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(source: std::io::Error) -> Self {
        ConfigError::IoError { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let error = ConfigError::InvalidValue {
            source_name: "environment".to_string(),
            key: "SWEEP_ENFORCE_VERSION".to_string(),
            value: "maybe".to_string(),
            expected: "true or false",
        };
        assert_eq!(
            error.to_string(),
            "Invalid value 'maybe' for SWEEP_ENFORCE_VERSION (from environment): expected true or false"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let error = ConfigError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(error.source().is_some());
        assert!(error.to_string().contains("denied"));
    }
}
