//! Win probability and confidence estimation
//!
//! The probability is the same logistic expectation the update engine uses.
//! Confidence blends how much data backs the ratings (the smaller of the two
//! match counts) with how decisive the rating gap is: an even matchup is an
//! uncertain call no matter how well both ratings are known.

use crate::error::{RatingError, Result};
use crate::rating::elo::expected_pair;
use crate::types::{PredictionResult, RatingRecord, Verdict};
use serde::{Deserialize, Serialize};

/// Configuration for the confidence estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Match count at which data confidence reaches 0.5
    pub half_confidence_matches: f64,
    /// Weight of data volume in the blend; the rest goes to the gap
    pub data_weight: f64,
    /// Probability above which a side is a strong favorite
    pub strong_favorite: f64,
    /// Probability above which a side is a slight favorite
    pub slight_favorite: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            half_confidence_matches: 20.0,
            data_weight: 0.6,
            strong_favorite: 0.6,
            slight_favorite: 0.55,
        }
    }
}

impl ConfidenceConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.half_confidence_matches.is_finite() || self.half_confidence_matches <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Half confidence match count must be positive".to_string(),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.data_weight) {
            return Err(RatingError::ConfigurationError {
                message: "Data weight must be within [0, 1]".to_string(),
            }
            .into());
        }

        if !(self.slight_favorite >= 0.5
            && self.strong_favorite >= self.slight_favorite
            && self.strong_favorite < 1.0)
        {
            return Err(RatingError::ConfigurationError {
                message: "Favorite thresholds must satisfy 0.5 <= slight <= strong < 1".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Confidence estimator
#[derive(Debug, Clone)]
pub struct ConfidenceEstimator {
    config: ConfidenceConfig,
    scale: f64,
}

impl ConfidenceEstimator {
    /// Create a new estimator using the engine's logistic scale
    pub fn new(config: ConfidenceConfig, scale: f64) -> Result<Self> {
        config.validate()?;

        Ok(Self { config, scale })
    }

    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// Confidence from data volume alone, in [0, 1)
    pub fn data_confidence(&self, matches_a: u32, matches_b: u32) -> f64 {
        let matches = matches_a.min(matches_b) as f64;
        matches / (matches + self.config.half_confidence_matches)
    }

    /// Blended confidence for a prediction, clamped to [0, 1]
    pub fn confidence(&self, probability_a: f64, matches_a: u32, matches_b: u32) -> f64 {
        let gap_certainty = (2.0 * probability_a - 1.0).abs();
        let blended = self.config.data_weight * self.data_confidence(matches_a, matches_b)
            + (1.0 - self.config.data_weight) * gap_certainty;

        blended.clamp(0.0, 1.0)
    }

    pub fn verdict(&self, probability_a: f64) -> Verdict {
        let strong = self.config.strong_favorite;
        let slight = self.config.slight_favorite;

        if probability_a > strong {
            Verdict::StrongFavoriteA
        } else if probability_a > slight {
            Verdict::SlightFavoriteA
        } else if probability_a > 1.0 - slight {
            Verdict::EvenMatch
        } else if probability_a > 1.0 - strong {
            Verdict::SlightFavoriteB
        } else {
            Verdict::StrongFavoriteB
        }
    }

    /// Predict from two ratings. Pure: callers decide which ratings to pass
    /// (current or decayed).
    pub fn predict(
        &self,
        a: &RatingRecord,
        rating_a: f64,
        b: &RatingRecord,
        rating_b: f64,
    ) -> PredictionResult {
        let (probability_a, probability_b) = expected_pair(rating_a, rating_b, self.scale);

        PredictionResult {
            entity_a: a.entity_id.clone(),
            entity_b: b.entity_id.clone(),
            win_probability_a: probability_a,
            win_probability_b: probability_b,
            confidence: self.confidence(probability_a, a.matches_played, b.matches_played),
            rating_difference: rating_a - rating_b,
            verdict: self.verdict(probability_a),
        }
    }

    /// Predict from the records' current ratings
    pub fn predict_records(&self, a: &RatingRecord, b: &RatingRecord) -> PredictionResult {
        self.predict(a, a.rating, b, b.rating)
    }
}
