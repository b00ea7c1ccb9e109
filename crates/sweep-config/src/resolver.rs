//! Ordered lookup chain for a single configuration value.
//!
//! A [`Resolver`] holds lookups in priority order. The first lookup that
//! yields a value wins; the typed default is the final fallback. A lookup
//! that finds a value it cannot parse fails the whole resolution instead of
//! falling through to a lower layer.

use std::str::FromStr;

use crate::errors::ConfigError;

type Lookup<'a, T> = Box<dyn Fn() -> Result<Option<T>, ConfigError> + 'a>;

pub struct Resolver<'a, T> {
    key: &'static str,
    lookups: Vec<Lookup<'a, T>>,
}

impl<'a, T> Resolver<'a, T> {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            lookups: Vec::new(),
        }
    }

    /// Append a lookup that cannot fail.
    pub fn then(mut self, lookup: impl Fn() -> Option<T> + 'a) -> Self {
        self.lookups.push(Box::new(move || Ok(lookup())));
        self
    }

    /// Append a lookup that may reject a malformed value.
    pub fn then_try(mut self, lookup: impl Fn() -> Result<Option<T>, ConfigError> + 'a) -> Self {
        self.lookups.push(Box::new(lookup));
        self
    }

    /// First value found, or `None` when every layer is empty.
    pub fn resolve(self) -> Result<Option<T>, ConfigError> {
        for lookup in &self.lookups {
            if let Some(value) = lookup()? {
                tracing::trace!(event = "config.resolver.value_resolved", key = self.key);
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub fn resolve_or(self, default: T) -> Result<T, ConfigError> {
        Ok(self.resolve()?.unwrap_or(default))
    }

    pub fn resolve_or_else(self, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
        Ok(self.resolve()?.unwrap_or_else(default))
    }
}

/// Non-empty, trimmed string from the environment.
pub fn env_string(var: &str) -> Option<String> {
    non_empty(std::env::var(var).ok()?)
}

/// Comma-separated list from the environment; blank entries are dropped.
pub fn env_list(var: &str) -> Option<Vec<String>> {
    let raw = std::env::var(var).ok()?;
    let items = split_list(&raw);
    if items.is_empty() { None } else { Some(items) }
}

/// Boolean from the environment, `true`/`false` in any case.
pub fn env_bool(var: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = env_string(var) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            source_name: "environment".to_string(),
            key: var.to_string(),
            value: raw,
            expected: "true or false",
        }),
    }
}

/// Numeric value from the environment.
pub fn env_parsed<T: FromStr>(var: &str, expected: &'static str) -> Result<Option<T>, ConfigError> {
    let Some(raw) = env_string(var) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            source_name: "environment".to_string(),
            key: var.to_string(),
            value: raw,
            expected,
        })
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a comma-separated list, trimming entries and keeping first occurrence order.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_layer_wins() {
        let value = Resolver::new("project_name")
            .then(|| None)
            .then(|| Some("from-env".to_string()))
            .then(|| Some("lower".to_string()))
            .resolve_or("default".to_string())
            .unwrap();
        assert_eq!(value, "from-env");
    }

    #[test]
    fn default_used_when_all_layers_empty() {
        let value = Resolver::<u32>::new("retention")
            .then(|| None)
            .resolve_or(30)
            .unwrap();
        assert_eq!(value, 30);
    }

    #[test]
    fn malformed_value_fails_instead_of_falling_through() {
        let result = Resolver::<u32>::new("retention")
            .then_try(|| {
                Err(ConfigError::InvalidValue {
                    source_name: "environment".to_string(),
                    key: "SWEEP_ARTIFACT_RETENTION_DAYS".to_string(),
                    value: "thirty".to_string(),
                    expected: "a whole number of days",
                })
            })
            .then(|| Some(7))
            .resolve_or(30);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn split_list_trims_and_dedupes() {
        assert_eq!(
            split_list(" eu-west-1, ,eu-west-2,eu-west-1 "),
            vec!["eu-west-1".to_string(), "eu-west-2".to_string()]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn env_helpers_read_process_environment() {
        temp_env::with_vars(
            [
                ("SWEEP_TEST_LIST", Some("a,b")),
                ("SWEEP_TEST_BOOL", Some("TRUE")),
                ("SWEEP_TEST_NUM", Some("14")),
                ("SWEEP_TEST_BLANK", Some("   ")),
            ],
            || {
                assert_eq!(
                    env_list("SWEEP_TEST_LIST"),
                    Some(vec!["a".to_string(), "b".to_string()])
                );
                assert_eq!(env_bool("SWEEP_TEST_BOOL").unwrap(), Some(true));
                assert_eq!(
                    env_parsed::<u32>("SWEEP_TEST_NUM", "a number").unwrap(),
                    Some(14)
                );
                assert_eq!(env_string("SWEEP_TEST_BLANK"), None);
            },
        );
    }

    #[test]
    fn env_bool_rejects_garbage() {
        temp_env::with_var("SWEEP_TEST_BOOL_BAD", Some("yes"), || {
            assert!(env_bool("SWEEP_TEST_BOOL_BAD").is_err());
        });
    }
}
