use crate::errors::SweepError;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Invalid artifact key '{key}'")]
    InvalidKey { key: String },

    #[error("Artifact URI '{uri}' does not belong to this store")]
    ForeignUri { uri: String },

    #[error("Artifact '{key}' already exists")]
    AlreadyExists { key: String },

    #[error("Artifact not found: {uri}")]
    NotFound { uri: String },

    #[error("IO error in artifact store: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl SweepError for ArtifactError {
    fn error_code(&self) -> &'static str {
        match self {
            ArtifactError::InvalidKey { .. } => "ARTIFACT_INVALID_KEY",
            ArtifactError::ForeignUri { .. } => "ARTIFACT_FOREIGN_URI",
            ArtifactError::AlreadyExists { .. } => "ARTIFACT_ALREADY_EXISTS",
            ArtifactError::NotFound { .. } => "ARTIFACT_NOT_FOUND",
            ArtifactError::IoError { .. } => "ARTIFACT_IO_ERROR",
        }
    }
}
