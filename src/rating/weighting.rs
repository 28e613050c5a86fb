//! Tournament importance weighting
//!
//! The importance multiplier applied to K is `tier_multiplier * stage_multiplier`.
//! Tags are normalized before lookup and unknown tags fall back to the default
//! multiplier so new tiers from the feed degrade gracefully.

use crate::error::{RatingError, Result};
use crate::utils::normalize_tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for match weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Multiplier per tournament tier
    pub tier_multipliers: BTreeMap<String, f64>,
    /// Multiplier per tournament stage
    pub stage_multipliers: BTreeMap<String, f64>,
    /// Used for empty or unrecognized tags
    pub default_multiplier: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        let tier_multipliers = [
            ("ti", 1.8),
            ("s", 1.5),
            ("a", 1.2),
            ("b", 1.0),
            ("c", 0.8),
            ("league", 0.9),
            ("qualifier", 0.5),
        ]
        .into_iter()
        .map(|(tag, multiplier)| (tag.to_string(), multiplier))
        .collect();

        let stage_multipliers = [
            ("qualifier", 0.5),
            ("group_stage", 0.9),
            ("main_event", 1.0),
            ("playoffs", 1.25),
            ("grand_final", 1.5),
        ]
        .into_iter()
        .map(|(tag, multiplier)| (tag.to_string(), multiplier))
        .collect();

        Self {
            tier_multipliers,
            stage_multipliers,
            default_multiplier: 1.0,
        }
    }
}

impl WeightingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let valid = |value: f64| value.is_finite() && value > 0.0;

        if !valid(self.default_multiplier) {
            return Err(RatingError::ConfigurationError {
                message: "Default multiplier must be positive".to_string(),
            }
            .into());
        }

        for (tag, multiplier) in self
            .tier_multipliers
            .iter()
            .chain(self.stage_multipliers.iter())
        {
            if !valid(*multiplier) {
                return Err(RatingError::ConfigurationError {
                    message: format!("Multiplier for '{}' must be positive", tag),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Match weighting policy
#[derive(Debug, Clone)]
pub struct MatchWeighting {
    tiers: BTreeMap<String, f64>,
    stages: BTreeMap<String, f64>,
    default_multiplier: f64,
}

impl MatchWeighting {
    /// Create a new weighting policy. Table keys are normalized here so the
    /// configuration may spell them freely.
    pub fn new(config: WeightingConfig) -> Result<Self> {
        config.validate()?;

        let normalize = |table: BTreeMap<String, f64>| {
            table
                .into_iter()
                .map(|(tag, multiplier)| (normalize_tag(&tag), multiplier))
                .collect()
        };

        Ok(Self {
            tiers: normalize(config.tier_multipliers),
            stages: normalize(config.stage_multipliers),
            default_multiplier: config.default_multiplier,
        })
    }

    pub fn tier_multiplier(&self, tier: &str) -> f64 {
        self.tiers
            .get(&normalize_tag(tier))
            .copied()
            .unwrap_or(self.default_multiplier)
    }

    pub fn stage_multiplier(&self, stage: &str) -> f64 {
        self.stages
            .get(&normalize_tag(stage))
            .copied()
            .unwrap_or(self.default_multiplier)
    }

    /// Importance multiplier applied to K
    pub fn multiplier(&self, tier: &str, stage: &str) -> f64 {
        self.tier_multiplier(tier) * self.stage_multiplier(stage)
    }
}

impl Default for MatchWeighting {
    fn default() -> Self {
        // Default tables are known to be valid
        Self::new(WeightingConfig::default()).unwrap_or_else(|_| Self {
            tiers: BTreeMap::new(),
            stages: BTreeMap::new(),
            default_multiplier: 1.0,
        })
    }
}
