//! Storage interface for plan documents, run reports, and run records.

use std::time::Duration;

use async_trait::async_trait;

use crate::artifacts::errors::ArtifactError;
use crate::artifacts::types::ArtifactUri;

/// Object storage for generated artifacts.
///
/// Objects are immutable once written; nothing in the engine deletes them.
/// Expiry is handled by [`ArtifactStore::prune`], driven by retention
/// settings outside the workflow.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Bucket name this store writes into.
    fn bucket(&self) -> &str;

    /// Write `body` under a new `key` and return its location. Existing
    /// objects are never replaced.
    async fn put(&self, key: &str, body: &str) -> Result<ArtifactUri, ArtifactError>;

    /// Read back an object previously returned by [`ArtifactStore::put`].
    async fn get(&self, uri: &ArtifactUri) -> Result<String, ArtifactError>;

    /// Remove objects under `prefix` older than `max_age`. Returns the count removed.
    async fn prune(&self, prefix: &str, max_age: Duration) -> Result<usize, ArtifactError>;
}
