//! Data model for monitored obligations, alert rules, and the alert lifecycle.

pub mod action;
pub mod alert;
pub mod filter;
pub mod notification;
pub mod obligation;
pub mod rule;
pub mod severity;
pub mod stats;

pub use action::{ActionStatus, AlertAction, NewAction};
pub use alert::{AlertStatus, ComplianceAlert, LifecycleCommand};
pub use filter::{page_size, AlertCursor, AlertFilter, AlertPage};
pub use notification::{DeliveryStatus, NotificationKind, NotificationLog, NotificationMessage};
pub use obligation::{MonitoredObligation, ObligationType};
pub use rule::{AlertRule, Channel, EscalationPolicy, NotificationSettings};
pub use severity::{Severity, SeverityThresholds};
pub use stats::AlertStats;
