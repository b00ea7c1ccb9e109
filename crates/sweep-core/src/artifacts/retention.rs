//! Retention sweeps over the artifact store.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::artifacts::traits::ArtifactStore;
use crate::artifacts::types::{OUTPUT_PREFIX, PLAN_PREFIX, RUN_LOG_PREFIX};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Applies artifact and run-log retention to a store.
///
/// Runs outside the workflow; failures are logged and never affect a run.
#[derive(Clone)]
pub struct Housekeeping {
    store: Arc<dyn ArtifactStore>,
    artifact_retention: Duration,
    log_retention: Duration,
}

impl Housekeeping {
    pub fn new(store: Arc<dyn ArtifactStore>, artifact_days: u32, log_days: u32) -> Self {
        Self {
            store,
            artifact_retention: DAY * artifact_days,
            log_retention: DAY * log_days,
        }
    }

    /// Prune every prefix. Returns the total number of objects removed.
    pub async fn sweep(&self) -> usize {
        let targets = [
            (PLAN_PREFIX, self.artifact_retention),
            (OUTPUT_PREFIX, self.artifact_retention),
            (RUN_LOG_PREFIX, self.log_retention),
        ];

        let mut removed = 0;
        for (prefix, max_age) in targets {
            match self.store.prune(prefix, max_age).await {
                Ok(count) => removed += count,
                Err(e) => warn!(
                    event = "core.artifacts.retention_failed",
                    prefix = prefix,
                    error = %e,
                ),
            }
        }
        removed
    }
}
