//! # vigil-notify
//!
//! Fans a notification out to every (recipient, channel) pair, runs each
//! blocking `Notifier::send` on the blocking pool under a timeout, retries
//! transient failures with exponential backoff, and turns every outcome into
//! a `NotificationLog`. Delivery errors never escape this crate.

pub mod dispatcher;
pub mod message;
pub mod notifiers;
pub mod retry;

pub use dispatcher::{NotificationDispatcher, NotificationJob};
pub use notifiers::{LogNotifier, RecordingNotifier};
pub use retry::RetryPolicy;
