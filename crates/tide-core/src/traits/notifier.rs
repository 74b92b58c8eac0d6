//! Notification sink trait definition.

use crate::error::NotifyError;
use async_trait::async_trait;

/// Trait for delivering formatted scan messages.
///
/// Delivery failures are reported to the caller, which logs them; the
/// scanner never retries a notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message. The text may contain the sink's markup (HTML).
    async fn send(&self, text: &str) -> Result<(), NotifyError>;

    /// Get the notifier name.
    fn name(&self) -> &str;
}
