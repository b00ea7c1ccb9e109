pub mod errors;
pub mod guard;

pub use errors::PolicyViolation;
pub use guard::validate;
