//! Inactivity decay
//!
//! Ratings of entities that stop playing are pulled toward the baseline once
//! a grace period has elapsed since their last rated match. Decay is lazy: it
//! is computed when an entity is touched by an update, a prediction, or an
//! explicit sweep. There is no background timer.

use crate::error::{RatingError, Result};
use crate::types::RatingRecord;
use crate::utils::days_between;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shape of the pull toward the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayMode {
    /// Remove a fraction `rate` of the gap to baseline per period
    Exponential,
    /// Move `rate` rating points toward baseline per period
    Linear,
}

/// Configuration for inactivity decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub enabled: bool,
    /// Days of inactivity before decay starts
    pub grace_period_days: i64,
    /// Length of one decay period in days
    pub period_days: i64,
    pub mode: DecayMode,
    pub rate: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grace_period_days: 365,
            period_days: 30,
            mode: DecayMode::Exponential,
            rate: 0.05,
        }
    }
}

impl DecayConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.grace_period_days < 0 {
            return Err(RatingError::ConfigurationError {
                message: "Decay grace period must be non-negative".to_string(),
            }
            .into());
        }

        if self.period_days <= 0 {
            return Err(RatingError::ConfigurationError {
                message: "Decay period must be positive".to_string(),
            }
            .into());
        }

        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Decay rate must be non-negative".to_string(),
            }
            .into());
        }

        if self.mode == DecayMode::Exponential && self.rate > 1.0 {
            return Err(RatingError::ConfigurationError {
                message: "Exponential decay rate must not exceed 1.0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Decay policy bound to a baseline rating
#[derive(Debug, Clone)]
pub struct DecayPolicy {
    config: DecayConfig,
    baseline: f64,
}

impl DecayPolicy {
    /// Create a new decay policy
    pub fn new(config: DecayConfig, baseline: f64) -> Result<Self> {
        config.validate()?;

        Ok(Self { config, baseline })
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Whole decay periods between the end of the grace period and `at`
    pub fn periods_since(&self, last_match: DateTime<Utc>, at: DateTime<Utc>) -> u32 {
        let inactive_days = days_between(last_match, at) - self.config.grace_period_days;
        if inactive_days <= 0 {
            return 0;
        }

        u32::try_from(inactive_days / self.config.period_days).unwrap_or(u32::MAX)
    }

    /// Periods due at `at` that a previous sweep has not already settled
    pub fn pending_periods(&self, record: &RatingRecord, at: DateTime<Utc>) -> u32 {
        if !self.config.enabled {
            return 0;
        }

        let Some(last_match) = record.last_match_at else {
            return 0;
        };

        let due = self.periods_since(last_match, at);
        let settled = record
            .decay_settled_at
            .map(|settled_at| self.periods_since(last_match, settled_at))
            .unwrap_or(0);

        due.saturating_sub(settled)
    }

    /// Pull a rating toward the baseline by `periods`. Never crosses the baseline.
    pub fn pull_toward_baseline(&self, rating: f64, periods: u32) -> f64 {
        if periods == 0 {
            return rating;
        }

        let gap = rating - self.baseline;
        match self.config.mode {
            DecayMode::Exponential => {
                let retained = (1.0 - self.config.rate).powf(periods as f64);
                self.baseline + gap * retained
            }
            DecayMode::Linear => {
                let pull = self.config.rate * periods as f64;
                if gap.abs() <= pull {
                    self.baseline
                } else {
                    rating - pull * gap.signum()
                }
            }
        }
    }

    /// Rating the record would have at `at`, without changing it
    pub fn decayed_rating(&self, record: &RatingRecord, at: DateTime<Utc>) -> f64 {
        self.pull_toward_baseline(record.rating, self.pending_periods(record, at))
    }

    /// Apply due decay to the record and mark it settled at `at`.
    ///
    /// Returns whether the rating changed. A history point is appended only
    /// when it did.
    pub fn settle(&self, record: &mut RatingRecord, at: DateTime<Utc>) -> bool {
        let decayed = self.decayed_rating(record, at);
        if decayed == record.rating {
            return false;
        }

        record.push_point(decayed, at);
        record.decay_settled_at = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, MatchResult};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    fn record_at(rating: f64) -> RatingRecord {
        let mut record = RatingRecord::new(EntityId::team("1"), 1500.0);
        record.record_match(rating, start(), MatchResult::Win);
        record
    }

    fn linear_policy(rate: f64) -> DecayPolicy {
        DecayPolicy::new(
            DecayConfig {
                mode: DecayMode::Linear,
                rate,
                ..Default::default()
            },
            1500.0,
        )
        .unwrap()
    }

    #[test]
    fn test_no_decay_within_grace_period() {
        let policy = DecayPolicy::new(DecayConfig::default(), 1500.0).unwrap();
        let record = record_at(1800.0);

        assert_eq!(policy.pending_periods(&record, start() + Duration::days(365)), 0);
        assert_eq!(policy.decayed_rating(&record, start() + Duration::days(394)), 1800.0);
    }

    #[test]
    fn test_exponential_decay_after_grace() {
        let policy = DecayPolicy::new(DecayConfig::default(), 1500.0).unwrap();
        let record = record_at(1800.0);

        // 365 grace + two full 30 day periods
        let at = start() + Duration::days(425);
        assert_eq!(policy.pending_periods(&record, at), 2);

        let expected = 1500.0 + 300.0 * 0.95f64.powi(2);
        assert!((policy.decayed_rating(&record, at) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_linear_decay_clamps_at_baseline() {
        let policy = linear_policy(40.0);
        let above = record_at(1550.0);
        let below = record_at(1420.0);
        let at = start() + Duration::days(365 + 30);

        assert_eq!(policy.decayed_rating(&above, at), 1510.0);
        assert_eq!(policy.decayed_rating(&below, at), 1460.0);

        let much_later = start() + Duration::days(365 + 300);
        assert_eq!(policy.decayed_rating(&above, much_later), 1500.0);
        assert_eq!(policy.decayed_rating(&below, much_later), 1500.0);
    }

    #[test]
    fn test_disabled_decay() {
        let policy = DecayPolicy::new(
            DecayConfig {
                enabled: false,
                ..Default::default()
            },
            1500.0,
        )
        .unwrap();
        let record = record_at(1900.0);

        assert_eq!(
            policy.decayed_rating(&record, start() + Duration::days(5000)),
            1900.0
        );
    }

    #[test]
    fn test_unplayed_entity_never_decays() {
        let policy = DecayPolicy::new(DecayConfig::default(), 1500.0).unwrap();
        let record = RatingRecord::new(EntityId::player("9"), 1500.0);

        assert_eq!(policy.pending_periods(&record, start() + Duration::days(5000)), 0);
    }

    #[test]
    fn test_settle_does_not_double_apply() {
        let policy = DecayPolicy::new(DecayConfig::default(), 1500.0).unwrap();
        let original = record_at(1900.0);

        let first_sweep = start() + Duration::days(365 + 65);
        let later = start() + Duration::days(365 + 200);

        let mut settled = original.clone();
        assert!(policy.settle(&mut settled, first_sweep));
        assert_eq!(settled.decay_settled_at, Some(first_sweep));
        assert_eq!(settled.last_recorded_at(), Some(first_sweep));
        assert_eq!(settled.last_match_at, Some(start()));

        // Settling again at the same instant changes nothing
        assert!(!policy.settle(&mut settled, first_sweep));

        let direct = policy.decayed_rating(&original, later);
        let via_sweep = policy.decayed_rating(&settled, later);
        assert!((direct - via_sweep).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = DecayConfig::default();
        config.period_days = 0;
        assert!(config.validate().is_err());

        config = DecayConfig::default();
        config.grace_period_days = -1;
        assert!(config.validate().is_err());

        config = DecayConfig::default();
        config.rate = 1.5;
        assert!(config.validate().is_err());

        config.mode = DecayMode::Linear;
        assert!(config.validate().is_ok());
    }

    proptest! {
        #[test]
        fn decay_is_monotone_and_never_crosses_baseline(
            rating in 500.0f64..3000.0,
            days_1 in 0i64..4000,
            extra_days in 0i64..4000,
            linear in any::<bool>(),
        ) {
            let policy = if linear {
                linear_policy(25.0)
            } else {
                DecayPolicy::new(DecayConfig::default(), 1500.0).unwrap()
            };
            let record = record_at(rating);

            let t1 = start() + Duration::days(days_1);
            let t2 = t1 + Duration::days(extra_days);
            let r1 = policy.decayed_rating(&record, t1);
            let r2 = policy.decayed_rating(&record, t2);

            prop_assert!((r2 - 1500.0).abs() <= (r1 - 1500.0).abs() + 1e-9);
            prop_assert!((r1 - 1500.0) * (rating - 1500.0) >= 0.0);
            prop_assert!((r2 - 1500.0) * (rating - 1500.0) >= 0.0);
        }
    }
}
