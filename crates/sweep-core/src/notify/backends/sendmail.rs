//! Mail delivery through the local `sendmail` binary.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::notify::errors::DeliveryError;
use crate::notify::traits::DeliveryBackend;
use crate::notify::types::NotificationMessage;

pub struct SendmailBackend {
    address: String,
}

impl SendmailBackend {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    fn envelope(&self, message: &NotificationMessage, message_id: &str) -> String {
        format!(
            "To: {}\nSubject: {}\nMessage-ID: <{}@sweep>\nContent-Type: text/plain; charset=utf-8\n\n{}",
            self.address,
            message.subject.replace(['\r', '\n'], " "),
            message_id,
            message.body
        )
    }
}

impl DeliveryBackend for SendmailBackend {
    fn name(&self) -> &'static str {
        "sendmail"
    }

    fn is_available(&self) -> bool {
        !self.address.trim().is_empty() && which::which("sendmail").is_ok()
    }

    fn deliver(&self, message: &NotificationMessage) -> Result<String, DeliveryError> {
        let message_id = uuid::Uuid::new_v4().to_string();
        let send_failed = |message: String| DeliveryError::SendFailed {
            backend: "sendmail",
            message,
        };

        let mut child = Command::new("sendmail")
            .arg("-i")
            .arg(&self.address)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| send_failed(format!("sendmail exec failed: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(self.envelope(message, &message_id).as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(message_id)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(send_failed(format!(
                "sendmail exit {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}
