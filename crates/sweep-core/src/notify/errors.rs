use crate::errors::SweepError;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("No notification transport available")]
    NoTransport,

    #[error("Delivery via {backend} failed: {message}")]
    SendFailed {
        backend: &'static str,
        message: String,
    },

    #[error("Delivery abandoned before it started")]
    Abandoned,

    #[error("IO error during delivery: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl SweepError for DeliveryError {
    fn error_code(&self) -> &'static str {
        match self {
            DeliveryError::NoTransport => "DELIVERY_NO_TRANSPORT",
            DeliveryError::SendFailed { .. } => "DELIVERY_SEND_FAILED",
            DeliveryError::Abandoned => "DELIVERY_ABANDONED",
            DeliveryError::IoError { .. } => "DELIVERY_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, DeliveryError::NoTransport)
    }
}
