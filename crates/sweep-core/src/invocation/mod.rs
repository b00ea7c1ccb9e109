pub mod types;

pub use types::{Invocation, InvocationRequest, PolicyParams, ProtectionTag};
