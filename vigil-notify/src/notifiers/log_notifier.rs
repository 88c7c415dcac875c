//! Notifier that writes each message to the tracing log.
//! Used as the in-app inbox and as a stand-in where no gateway is wired.

use vigil_core::errors::NotificationError;
use vigil_core::models::{Channel, NotificationMessage};
use vigil_core::traits::Notifier;

#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    channel: Channel,
}

impl LogNotifier {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// One notifier per known channel.
    pub fn all_channels() -> Vec<Self> {
        Channel::ALL.into_iter().map(Self::new).collect()
    }
}

impl Notifier for LogNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotificationError> {
        tracing::info!(
            channel = %self.channel,
            recipient,
            kind = %message.kind,
            subject = %message.subject,
            "notification"
        );
        Ok(())
    }
}
