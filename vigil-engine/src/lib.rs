//! # vigil-engine
//!
//! The compliance alert engine: classifies obligations against their rules,
//! reconciles alerts once per cycle, escalates neglected alerts, and applies
//! operator lifecycle commands. [`ComplianceEngine`] is the entry point.

pub mod catalog;
pub mod classifier;
pub mod engine;
pub mod escalation;
pub mod evaluation;
pub mod lifecycle;
pub mod sources;
pub mod worker;

pub use catalog::{RuleCatalog, RuleSnapshot};
pub use classifier::{days_until_expiry, Classification, SeverityClassifier};
pub use engine::ComplianceEngine;
pub use escalation::{EscalationEngine, EscalationReport};
pub use evaluation::{CycleReport, EvaluationScheduler, ObligationFailure, Outcome};
pub use lifecycle::AlertLifecycleController;
pub use sources::{JsonFileObligationSource, StaticObligationSource};
pub use worker::{spawn_worker, WorkerHandle};
