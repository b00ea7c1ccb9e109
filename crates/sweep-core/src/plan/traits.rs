use async_trait::async_trait;

use crate::plan::errors::GenerationError;
use crate::plan::types::{PlanArtifact, PlanRequest};

/// Turns a validated invocation into a scoped deletion-plan artifact.
///
/// A plan that matches nothing is still a valid plan; only internal faults
/// (rendering, storage) are errors.
#[async_trait]
pub trait ConfigGenerator: Send + Sync {
    async fn generate(&self, request: &PlanRequest) -> Result<PlanArtifact, GenerationError>;
}
