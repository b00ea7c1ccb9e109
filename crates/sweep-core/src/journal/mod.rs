//! Terminal run records written to the artifact store.

pub mod errors;

use std::sync::Arc;

use tracing::debug;

use crate::artifacts::{ArtifactStore, ArtifactUri, RUN_LOG_PREFIX, key_timestamp};
use crate::engine::Outcome;

pub use errors::JournalError;

#[derive(Clone)]
pub struct RunJournal {
    store: Arc<dyn ArtifactStore>,
}

impl RunJournal {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Write `outcome` as `run-logs/run-<timestamp>-<run id>.json`.
    pub async fn record(&self, outcome: &Outcome) -> Result<ArtifactUri, JournalError> {
        let body = serde_json::to_string_pretty(outcome)?;
        let key = format!(
            "{}/run-{}-{}.json",
            RUN_LOG_PREFIX,
            key_timestamp(),
            outcome.run_id
        );
        let uri = self.store.put(&key, &body).await?;
        debug!(
            event = "core.journal.record_completed",
            run_id = %outcome.run_id,
            uri = %uri,
        );
        Ok(uri)
    }
}
