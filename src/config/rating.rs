//! Rating system configuration

use crate::error::{RatingError, Result};
use crate::rating::confidence::ConfidenceConfig;
use crate::rating::decay::{DecayConfig, DecayMode};
use crate::rating::elo::DEFAULT_SCALE;
use crate::rating::k_factor::KFactorConfig;
use crate::rating::weighting::WeightingConfig;
use serde::{Deserialize, Serialize};

/// Complete configuration of the rating engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating of a newly seen entity and target of decay
    pub baseline_rating: f64,
    /// Logistic scale of the expected-score model
    pub scale: f64,
    /// Whether draws are accepted (Dota 2 has none)
    pub allow_draws: bool,
    pub k_factor: KFactorConfig,
    pub weighting: WeightingConfig,
    pub decay: DecayConfig,
    pub confidence: ConfidenceConfig,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            baseline_rating: 1500.0,
            scale: DEFAULT_SCALE,
            allow_draws: false,
            k_factor: KFactorConfig::default(),
            weighting: WeightingConfig::default(),
            decay: DecayConfig::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl RatingConfig {
    /// Create conservative configuration (slower rating changes)
    pub fn conservative() -> Self {
        let mut config = Self::default();
        config.k_factor.base_k = 24.0;
        config.k_factor.experience_floor = 0.6;
        config.decay = DecayConfig {
            grace_period_days: 540,
            rate: 0.03,
            ..DecayConfig::default()
        };
        config
    }

    /// Create aggressive configuration (faster rating changes)
    pub fn aggressive() -> Self {
        let mut config = Self::default();
        config.k_factor.base_k = 40.0;
        config.k_factor.rating_bands = KFactorConfig::default_rating_bands();
        config.decay = DecayConfig {
            grace_period_days: 180,
            mode: DecayMode::Exponential,
            rate: 0.08,
            ..DecayConfig::default()
        };
        config
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.baseline_rating.is_finite() {
            return Err(RatingError::ConfigurationError {
                message: "Baseline rating must be finite".to_string(),
            }
            .into());
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Logistic scale must be positive".to_string(),
            }
            .into());
        }

        self.k_factor.validate()?;
        self.weighting.validate()?;
        self.decay.validate()?;
        self.confidence.validate()?;

        Ok(())
    }
}
