pub mod document;
pub mod errors;
pub mod generator;
pub mod traits;
pub mod types;

pub use document::NukePlanDocument;
pub use errors::GenerationError;
pub use generator::NukePlanGenerator;
pub use traits::ConfigGenerator;
pub use types::{PlanArtifact, PlanRequest};
