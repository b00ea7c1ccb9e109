use async_trait::async_trait;

use crate::executor::errors::ExecutorError;
use crate::executor::types::{ExecutionRequest, ExecutionResult};

/// Consumes a plan and performs, or under dry run simulates, the sweep.
///
/// Implementations must never delete a resource carrying the request's
/// protection tag, and must return [`ExecutorError::VersionMismatch`]
/// without deleting anything when `enforce_version` is set and the tool's
/// version differs. A sweep that ran and failed is an `Ok` result with
/// `success = false`.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutorError>;
}
