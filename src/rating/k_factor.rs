//! Dynamic K-factor policy
//!
//! K shrinks as an entity accumulates rated matches, optionally varies with
//! the entity's rating band, and is scaled by the match importance that the
//! weighting policy derives from tournament tier and stage.

use crate::error::{RatingError, Result};
use crate::types::ExperienceLevel;
use serde::{Deserialize, Serialize};

/// Experience breakpoint: entities with at least `min_matches` rated matches
/// use `factor` until the next breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceStep {
    pub min_matches: u32,
    pub factor: f64,
}

/// Rating band: ratings strictly below `below` use `factor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBand {
    pub below: f64,
    pub factor: f64,
}

/// Configuration for the K-factor policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KFactorConfig {
    /// K before any adjustment
    pub base_k: f64,
    /// Step function over match count, ascending by `min_matches`
    pub experience_steps: Vec<ExperienceStep>,
    /// Lower bound on the experience factor
    pub experience_floor: f64,
    /// Match count assumed for entities flagged `Established` upstream
    pub established_after: u32,
    /// Optional rating bands, ascending by `below`; empty means factor 1.0
    pub rating_bands: Vec<RatingBand>,
}

impl Default for KFactorConfig {
    fn default() -> Self {
        Self {
            base_k: 32.0,
            experience_steps: vec![
                ExperienceStep {
                    min_matches: 0,
                    factor: 1.5,
                },
                ExperienceStep {
                    min_matches: 10,
                    factor: 1.25,
                },
                ExperienceStep {
                    min_matches: 30,
                    factor: 1.0,
                },
                ExperienceStep {
                    min_matches: 100,
                    factor: 0.8,
                },
            ],
            experience_floor: 0.5,
            established_after: 30,
            rating_bands: Vec::new(),
        }
    }
}

impl KFactorConfig {
    /// Bands that let low-rated entities move faster and slow down the elite
    pub fn default_rating_bands() -> Vec<RatingBand> {
        vec![
            RatingBand {
                below: 1200.0,
                factor: 1.5,
            },
            RatingBand {
                below: 2000.0,
                factor: 1.2,
            },
            RatingBand {
                below: 2400.0,
                factor: 1.0,
            },
            RatingBand {
                below: f64::MAX,
                factor: 0.8,
            },
        ]
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.base_k.is_finite() || self.base_k <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Base K must be positive".to_string(),
            }
            .into());
        }

        if !self.experience_floor.is_finite() || self.experience_floor <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Experience floor must be positive".to_string(),
            }
            .into());
        }

        for step in &self.experience_steps {
            if !step.factor.is_finite() || step.factor <= 0.0 {
                return Err(RatingError::ConfigurationError {
                    message: format!(
                        "Experience factor at {} matches must be positive",
                        step.min_matches
                    ),
                }
                .into());
            }
        }

        for pair in self.experience_steps.windows(2) {
            if pair[1].min_matches <= pair[0].min_matches {
                return Err(RatingError::ConfigurationError {
                    message: "Experience breakpoints must be strictly ascending".to_string(),
                }
                .into());
            }
            if pair[1].factor > pair[0].factor {
                return Err(RatingError::ConfigurationError {
                    message: "Experience factors must not increase with match count".to_string(),
                }
                .into());
            }
        }

        for band in &self.rating_bands {
            if !band.factor.is_finite() || band.factor <= 0.0 || band.below.is_nan() {
                return Err(RatingError::ConfigurationError {
                    message: "Rating band factors must be positive".to_string(),
                }
                .into());
            }
        }

        for pair in self.rating_bands.windows(2) {
            if pair[1].below <= pair[0].below {
                return Err(RatingError::ConfigurationError {
                    message: "Rating bands must be strictly ascending".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// K-factor policy
#[derive(Debug, Clone)]
pub struct KFactorPolicy {
    config: KFactorConfig,
}

impl KFactorPolicy {
    /// Create a new K-factor policy
    pub fn new(config: KFactorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &KFactorConfig {
        &self.config
    }

    /// Match count the experience factor should see, honouring the upstream hint
    pub fn effective_match_count(&self, matches_played: u32, hint: ExperienceLevel) -> u32 {
        match hint {
            ExperienceLevel::New => matches_played,
            ExperienceLevel::Established => matches_played.max(self.config.established_after),
        }
    }

    /// Non-increasing in `matches_played`, never below the floor
    pub fn experience_factor(&self, matches_played: u32) -> f64 {
        let factor = self
            .config
            .experience_steps
            .iter()
            .take_while(|step| step.min_matches <= matches_played)
            .last()
            .map(|step| step.factor)
            .unwrap_or(1.0);

        factor.max(self.config.experience_floor)
    }

    pub fn rating_factor(&self, rating: f64) -> f64 {
        self.config
            .rating_bands
            .iter()
            .find(|band| rating < band.below)
            .map(|band| band.factor)
            .unwrap_or(1.0)
    }

    /// Effective K for one side of a match
    pub fn k_factor(
        &self,
        matches_played: u32,
        hint: ExperienceLevel,
        rating: f64,
        importance: f64,
    ) -> f64 {
        let count = self.effective_match_count(matches_played, hint);

        self.config.base_k * self.experience_factor(count) * self.rating_factor(rating) * importance
    }
}

impl Default for KFactorPolicy {
    fn default() -> Self {
        Self {
            config: KFactorConfig::default(),
        }
    }
}
