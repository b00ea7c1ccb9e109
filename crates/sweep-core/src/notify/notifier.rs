use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{error, info};

use crate::notify::errors::DeliveryError;
use crate::notify::registry::DeliveryRegistry;
use crate::notify::traits::Notifier;
use crate::notify::types::{DeliveryReceipt, NotificationMessage, NotificationRequest};

/// Renders a message and hands it to the first available backend.
pub struct RegistryNotifier {
    registry: Arc<DeliveryRegistry>,
}

impl RegistryNotifier {
    pub fn new(registry: DeliveryRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

#[async_trait]
impl Notifier for RegistryNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let message = NotificationMessage::render(request);
        info!(
            event = "core.notify.deliver_started",
            execution_id = %request.execution_id,
            subject = %message.subject,
        );

        // Backends shell out or write files synchronously. If the caller
        // drops this future (stage timeout, cancellation) before the blocking
        // task starts, the task skips delivery. A delivery already handed to a
        // backend cannot be recalled.
        let registry = Arc::clone(&self.registry);
        let abandoned = Arc::new(AtomicBool::new(false));
        let _guard = AbandonOnDrop(Arc::clone(&abandoned));
        let delivered =
            tokio::task::spawn_blocking(move || deliver_unless_abandoned(&registry, &message, &abandoned))
                .await
            .map_err(|e| DeliveryError::SendFailed {
                backend: "registry",
                message: format!("delivery task failed: {}", e),
            })?;

        match delivered {
            Ok((backend, message_id)) => {
                info!(
                    event = "core.notify.deliver_completed",
                    execution_id = %request.execution_id,
                    backend = backend,
                    message_id = %message_id,
                );
                Ok(DeliveryReceipt {
                    backend: backend.to_string(),
                    message_id,
                })
            }
            Err(e) => {
                error!(
                    event = "core.notify.deliver_failed",
                    execution_id = %request.execution_id,
                    error = %e,
                );
                Err(e)
            }
        }
    }
}

/// Marks a pending delivery as abandoned when the notify future goes away.
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn deliver_unless_abandoned(
    registry: &DeliveryRegistry,
    message: &NotificationMessage,
    abandoned: &AtomicBool,
) -> Result<(&'static str, String), DeliveryError> {
    if abandoned.load(Ordering::SeqCst) {
        return Err(DeliveryError::Abandoned);
    }
    registry.deliver(message)
}
