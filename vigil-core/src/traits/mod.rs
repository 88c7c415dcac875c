//! Seams between the engine and its collaborators.

pub mod alert_store;
pub mod cancellation;
pub mod clock;
pub mod notifier;
pub mod obligation_source;

pub use alert_store::IAlertStore;
pub use cancellation::{Cancellable, CancellationToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::Notifier;
pub use obligation_source::ObligationSource;
