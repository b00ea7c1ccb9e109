//! Notifier and delivery backend trait definitions.

use async_trait::async_trait;

use crate::notify::errors::DeliveryError;
use crate::notify::types::{DeliveryReceipt, NotificationMessage, NotificationRequest};

/// Turns an execution summary into a delivered notification.
///
/// A notifier that cannot deliver must return an error; the engine treats
/// an undelivered notification as a failed run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, DeliveryError>;
}

/// A single transport for rendered messages.
pub trait DeliveryBackend: Send + Sync {
    /// The canonical name of this backend (e.g., "sendmail", "outbox").
    fn name(&self) -> &'static str;

    /// Check if this backend can deliver on this system.
    fn is_available(&self) -> bool;

    /// Deliver a message, returning a backend-specific message id.
    fn deliver(&self, message: &NotificationMessage) -> Result<String, DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockBackend {
        available: bool,
    }

    impl DeliveryBackend for MockBackend {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn deliver(&self, _message: &NotificationMessage) -> Result<String, DeliveryError> {
            if self.available {
                Ok("mock-1".to_string())
            } else {
                Err(DeliveryError::NoTransport)
            }
        }
    }

    fn message() -> NotificationMessage {
        NotificationMessage {
            subject: "Test".to_string(),
            body: "Hello".to_string(),
        }
    }

    #[test]
    fn mock_delivery_backend_available() {
        let backend = MockBackend { available: true };
        assert_eq!(backend.name(), "mock");
        assert!(backend.is_available());
        assert_eq!(backend.deliver(&message()).unwrap(), "mock-1");
    }

    #[test]
    fn mock_delivery_backend_unavailable() {
        let backend = MockBackend { available: false };
        assert!(!backend.is_available());
        assert!(backend.deliver(&message()).is_err());
    }
}
