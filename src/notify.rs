//! SMS notification side channel.
//!
//! Notifications are sent only after the atomic group they describe has
//! committed. A failed send is logged and reported back as
//! [`Delivery::Failed`]; it never undoes the ledger change.

use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification to {phone} failed: {reason}")]
    Failed { phone: String, reason: String },
}

pub trait Notifier: Send + Sync {
    fn send(&self, phone: &str, text: &str) -> Result<(), NotifyError>;
}

/// Writes outgoing messages to the log instead of an SMS gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, phone: &str, text: &str) -> Result<(), NotifyError> {
        info!(phone, text, "SMS notification");
        Ok(())
    }
}

/// What happened to the notification attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Delivery {
    #[default]
    NotRequested,
    Sent,
    Failed(NotifyError),
}
