//! Local JSON-lines outbox. Always available; the fallback transport.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::notify::errors::DeliveryError;
use crate::notify::traits::DeliveryBackend;
use crate::notify::types::NotificationMessage;

pub const OUTBOX_FILE: &str = "outbox.jsonl";

pub struct OutboxBackend {
    path: PathBuf,
    address: Option<String>,
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: &'a str,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    subject: &'a str,
    body: &'a str,
}

impl OutboxBackend {
    pub fn new(path: impl Into<PathBuf>, address: Option<String>) -> Self {
        Self {
            path: path.into(),
            address,
        }
    }
}

impl DeliveryBackend for OutboxBackend {
    fn name(&self) -> &'static str {
        "outbox"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn deliver(&self, message: &NotificationMessage) -> Result<String, DeliveryError> {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = OutboxEntry {
            id: &id,
            timestamp: Utc::now().to_rfc3339(),
            address: self.address.as_deref(),
            subject: &message.subject,
            body: &message.body,
        };
        let line = serde_json::to_string(&entry).map_err(|e| DeliveryError::SendFailed {
            backend: "outbox",
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        tracing::debug!(
            event = "core.notify.outbox_appended",
            path = %self.path.display(),
            id = %id,
        );
        Ok(id)
    }
}
