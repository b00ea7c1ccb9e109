pub mod errors;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::WorkflowError;
pub use types::{ErrorRecord, Outcome, RunId, RunStatus, WorkflowRun, WorkflowStage};
pub use workflow::WorkflowEngine;
