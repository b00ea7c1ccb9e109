//! Delivery backend implementations.

mod outbox;
mod sendmail;

pub use outbox::{OUTBOX_FILE, OutboxBackend};
pub use sendmail::SendmailBackend;
