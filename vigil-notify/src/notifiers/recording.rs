//! In-memory notifier that records every send. Can be scripted to fail or
//! stall, for exercising retry and timeout paths.

use std::sync::Mutex;
use std::time::Duration;

use vigil_core::errors::NotificationError;
use vigil_core::models::{Channel, NotificationKind, NotificationMessage};
use vigil_core::traits::Notifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub channel: Channel,
    pub recipient: String,
    pub kind: NotificationKind,
    pub subject: String,
}

#[derive(Debug, Default)]
struct Script {
    transient_failures: u32,
    rejected: Vec<String>,
    stall: Option<Duration>,
}

#[derive(Debug)]
pub struct RecordingNotifier {
    channel: Channel,
    sent: Mutex<Vec<SentNotification>>,
    attempts: Mutex<u32>,
    script: Mutex<Script>,
}

impl RecordingNotifier {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            sent: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            script: Mutex::new(Script::default()),
        }
    }

    /// Fail the next `n` sends with a transient transport error.
    pub fn fail_next(&self, n: u32) {
        lock(&self.script).transient_failures = n;
    }

    /// Permanently reject sends to `recipient`.
    pub fn reject(&self, recipient: impl Into<String>) {
        lock(&self.script).rejected.push(recipient.into());
    }

    /// Block every send for `delay` before succeeding.
    pub fn stall_for(&self, delay: Duration) {
        lock(&self.script).stall = Some(delay);
    }

    pub fn clear_script(&self) {
        *lock(&self.script) = Script::default();
    }

    /// Successful sends, in order.
    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }

    pub fn sent_of(&self, kind: NotificationKind) -> Vec<SentNotification> {
        self.sent().into_iter().filter(|s| s.kind == kind).collect()
    }

    /// Every call to `send`, successful or not.
    pub fn attempts(&self) -> u32 {
        *lock(&self.attempts)
    }
}

impl Notifier for RecordingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotificationError> {
        *lock(&self.attempts) += 1;

        let stall = {
            let mut script = lock(&self.script);
            if script.rejected.iter().any(|r| r == recipient) {
                return Err(NotificationError::Rejected {
                    channel: self.channel,
                    recipient: recipient.to_string(),
                    message: "recipient rejected".to_string(),
                });
            }
            if script.transient_failures > 0 {
                script.transient_failures -= 1;
                return Err(NotificationError::Transport {
                    channel: self.channel,
                    recipient: recipient.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            script.stall
        };
        if let Some(delay) = stall {
            std::thread::sleep(delay);
        }

        lock(&self.sent).push(SentNotification {
            channel: self.channel,
            recipient: recipient.to_string(),
            kind: message.kind,
            subject: message.subject.clone(),
        });
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}
