//! Severity tiers and the per-rule day thresholds that produce them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk tier derived from days-until-expiry. Ordered from least to most urgent,
/// so `Severity::Critical > Severity::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Most urgent first.
    pub const BY_URGENCY: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::BY_URGENCY.into_iter().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds per tier, in clear days: whole days left before the expiry
/// day, which itself is not counted. An obligation expiring in 15 days has 14
/// clear days. A tier applies when `clear_days <= bound`; the tightest
/// applicable tier wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl SeverityThresholds {
    pub const fn new(critical: i64, high: i64, medium: i64, low: i64) -> Self {
        Self {
            critical,
            high,
            medium,
            low,
        }
    }

    pub fn bound(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Days left before the expiry day. Negative once the expiry day has passed.
    pub const fn clear_days(days_until_expiry: i64) -> i64 {
        days_until_expiry.saturating_sub(1)
    }

    /// Tightest tier whose bound covers the clear days left, or `None` when
    /// the obligation is further out than the `low` bound.
    pub fn tier_for(&self, days_until_expiry: i64) -> Option<Severity> {
        let clear = Self::clear_days(days_until_expiry);
        Severity::BY_URGENCY
            .into_iter()
            .find(|s| clear <= self.bound(*s))
    }

    /// Bounds must be non-negative and non-decreasing from critical to low.
    pub fn validate(&self) -> Result<(), String> {
        if self.critical < 0 {
            return Err(format!("critical bound must be >= 0, got {}", self.critical));
        }
        let ordered = [self.critical, self.high, self.medium, self.low];
        if ordered.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!(
                "bounds must satisfy critical <= high <= medium <= low, got {{critical:{}, high:{}, medium:{}, low:{}}}",
                self.critical, self.high, self.medium, self.low
            ));
        }
        Ok(())
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self::new(7, 14, 30, 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn tier_for_picks_tightest_bound() {
        let t = SeverityThresholds::default();
        assert_eq!(t.tier_for(0), Some(Severity::Critical));
        assert_eq!(t.tier_for(5), Some(Severity::Critical));
        assert_eq!(t.tier_for(8), Some(Severity::Critical));
        assert_eq!(t.tier_for(9), Some(Severity::High));
        assert_eq!(t.tier_for(15), Some(Severity::High));
        assert_eq!(t.tier_for(16), Some(Severity::Medium));
        assert_eq!(t.tier_for(31), Some(Severity::Medium));
        assert_eq!(t.tier_for(32), Some(Severity::Low));
        assert_eq!(t.tier_for(61), Some(Severity::Low));
        assert_eq!(t.tier_for(62), None);
    }

    #[test]
    fn expiry_day_is_not_a_clear_day() {
        assert_eq!(SeverityThresholds::clear_days(15), 14);
        assert_eq!(SeverityThresholds::clear_days(0), -1);
        assert_eq!(SeverityThresholds::clear_days(i64::MIN), i64::MIN);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        assert!(SeverityThresholds::new(14, 7, 30, 60).validate().is_err());
        assert!(SeverityThresholds::new(-1, 7, 30, 60).validate().is_err());
        assert!(SeverityThresholds::new(7, 7, 30, 30).validate().is_ok());
    }
}
