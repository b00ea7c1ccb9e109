use crate::artifacts::ArtifactError;
use crate::errors::SweepError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Failed to render plan document: {message}")]
    RenderFailed { message: String },

    #[error("Failed to store plan document: {source}")]
    StorageFailed {
        #[from]
        source: ArtifactError,
    },
}

impl SweepError for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            GenerationError::RenderFailed { .. } => "PLAN_RENDER_FAILED",
            GenerationError::StorageFailed { .. } => "PLAN_STORAGE_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failed_wraps_artifact_error() {
        let error = GenerationError::from(ArtifactError::InvalidKey {
            key: "../x".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Failed to store plan document: Invalid artifact key '../x'"
        );
        assert_eq!(error.error_code(), "PLAN_STORAGE_FAILED");
        assert!(!error.is_user_error());
    }
}
