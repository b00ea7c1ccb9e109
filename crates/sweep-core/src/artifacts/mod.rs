pub mod errors;
pub mod local;
pub mod retention;
pub mod traits;
pub mod types;

pub use errors::ArtifactError;
pub use local::LocalArtifactStore;
pub use retention::Housekeeping;
pub use traits::ArtifactStore;
pub use types::{ArtifactUri, OUTPUT_PREFIX, PLAN_PREFIX, RUN_LOG_PREFIX, key_timestamp};
