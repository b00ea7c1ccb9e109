pub mod errors;
pub mod output;
pub mod tool;
pub mod traits;
pub mod types;

pub use errors::{ExecutionError, ExecutorError};
pub use tool::ToolExecutor;
pub use traits::Executor;
pub use types::{ExecutionRequest, ExecutionResult, ResourceDescriptor};
