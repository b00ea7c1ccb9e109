use crate::artifacts::ArtifactError;
use crate::errors::SweepError;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Failed to serialize run record: {source}")]
    SerializeFailed {
        #[from]
        source: serde_json::Error,
    },

    #[error("Failed to store run record: {source}")]
    StorageFailed {
        #[from]
        source: ArtifactError,
    },
}

impl SweepError for JournalError {
    fn error_code(&self) -> &'static str {
        match self {
            JournalError::SerializeFailed { .. } => "JOURNAL_SERIALIZE_FAILED",
            JournalError::StorageFailed { .. } => "JOURNAL_STORAGE_FAILED",
        }
    }
}
