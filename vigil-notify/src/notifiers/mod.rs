//! Built-in `Notifier` implementations.

pub mod log_notifier;
pub mod recording;

pub use log_notifier::LogNotifier;
pub use recording::{RecordingNotifier, SentNotification};
