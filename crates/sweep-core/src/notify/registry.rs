//! Registry of delivery backends, tried in priority order.

use std::path::Path;

use tracing::debug;

use super::backends::{OUTBOX_FILE, OutboxBackend, SendmailBackend};
use super::errors::DeliveryError;
use super::traits::DeliveryBackend;
use super::types::NotificationMessage;

pub struct DeliveryRegistry {
    backends: Vec<Box<dyn DeliveryBackend>>,
}

impl DeliveryRegistry {
    pub fn new(backends: Vec<Box<dyn DeliveryBackend>>) -> Self {
        Self { backends }
    }

    /// Mail when an address is configured and `sendmail` exists, else the local outbox.
    pub fn standard(address: Option<&str>, artifact_dir: &Path) -> Self {
        let mut backends: Vec<Box<dyn DeliveryBackend>> = Vec::new();
        if let Some(address) = address {
            backends.push(Box::new(SendmailBackend::new(address)));
        }
        backends.push(Box::new(OutboxBackend::new(
            artifact_dir.join(OUTBOX_FILE),
            address.map(str::to_string),
        )));
        Self::new(backends)
    }

    /// Detect the first available delivery backend.
    pub fn detect(&self) -> Option<&dyn DeliveryBackend> {
        self.backends.iter().find_map(|b| {
            if b.is_available() {
                Some(b.as_ref())
            } else {
                None
            }
        })
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Deliver via the first available backend.
    ///
    /// Unlike best-effort desktop notifications, finding no backend is an error.
    pub fn deliver(
        &self,
        message: &NotificationMessage,
    ) -> Result<(&'static str, String), DeliveryError> {
        let Some(backend) = self.detect() else {
            debug!(
                event = "core.notify.deliver_skipped",
                reason = "no backend available",
            );
            return Err(DeliveryError::NoTransport);
        };
        let id = backend.deliver(message)?;
        Ok((backend.name(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unavailable;

    impl DeliveryBackend for Unavailable {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn deliver(&self, _message: &NotificationMessage) -> Result<String, DeliveryError> {
            unreachable!("unavailable backend must not be used")
        }
    }

    fn message() -> NotificationMessage {
        NotificationMessage {
            subject: "s".to_string(),
            body: "b".to_string(),
        }
    }

    #[test]
    fn standard_registry_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DeliveryRegistry::standard(Some("ops@example.com"), dir.path());
        assert_eq!(registry.backend_names(), ["sendmail", "outbox"]);

        let registry = DeliveryRegistry::standard(None, dir.path());
        assert_eq!(registry.backend_names(), ["outbox"]);
    }

    #[test]
    fn empty_registry_has_no_transport() {
        let registry = DeliveryRegistry::new(vec![Box::new(Unavailable)]);
        assert!(registry.detect().is_none());
        assert!(matches!(
            registry.deliver(&message()),
            Err(DeliveryError::NoTransport)
        ));
    }

    #[test]
    fn skips_unavailable_backends() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DeliveryRegistry::new(vec![
            Box::new(Unavailable),
            Box::new(OutboxBackend::new(dir.path().join(OUTBOX_FILE), None)),
        ]);
        let (backend, _id) = registry.deliver(&message()).unwrap();
        assert_eq!(backend, "outbox");
    }
}
