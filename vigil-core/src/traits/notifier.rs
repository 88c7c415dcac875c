use crate::errors::NotificationError;
use crate::models::{Channel, NotificationMessage};

/// A single delivery transport (email gateway, SMS provider, in-app inbox).
///
/// `send` may block; the dispatcher runs it off the async executor and
/// applies its own timeout and retry policy.
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;
    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotificationError>;
}
