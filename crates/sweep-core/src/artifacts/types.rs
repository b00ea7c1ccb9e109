use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Location of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactUri(String);

impl ArtifactUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key prefix for generated plan documents.
pub const PLAN_PREFIX: &str = "nuke-configs";
/// Key prefix for executor output reports.
pub const OUTPUT_PREFIX: &str = "nuke-outputs";
/// Key prefix for terminal run records.
pub const RUN_LOG_PREFIX: &str = "run-logs";

/// UTC timestamp used in artifact keys, e.g. `20250101-120000`.
pub fn key_timestamp() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}
