//! Safety-gated cleanup workflow engine.
//!
//! A run validates its invocation against the account blocklist and region
//! allow-list, generates a scoped deletion plan, executes it (or simulates
//! it under dry run), and optionally notifies. The [`WorkflowEngine`]
//! drives those stages; the [`ScheduleTrigger`] feeds it pre-approved
//! invocations on a schedule.

pub mod artifacts;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod invocation;
pub mod journal;
pub mod lock;
pub mod logging;
pub mod notify;
pub mod plan;
pub mod policy;
pub mod schedule;

pub use artifacts::{ArtifactStore, ArtifactUri, Housekeeping, LocalArtifactStore};
pub use engine::{Outcome, RunId, RunStatus, WorkflowEngine, WorkflowError, WorkflowRun, WorkflowStage};
pub use errors::{SweepError, SweepResult, log_app_error};
pub use executor::{ExecutionResult, Executor, ToolExecutor};
pub use invocation::{Invocation, InvocationRequest, PolicyParams, ProtectionTag};
pub use journal::RunJournal;
pub use lock::AccountLocks;
pub use logging::init_logging;
pub use notify::{DeliveryRegistry, Notifier, RegistryNotifier};
pub use plan::{ConfigGenerator, NukePlanGenerator};
pub use policy::PolicyViolation;
pub use schedule::{ScheduleExpression, ScheduleTrigger};
