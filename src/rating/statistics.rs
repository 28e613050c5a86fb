//! Rating distribution statistics for reporting

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named rating brackets used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingBracket {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
}

impl RatingBracket {
    pub const ALL: [RatingBracket; 7] = [
        RatingBracket::Bronze,
        RatingBracket::Silver,
        RatingBracket::Gold,
        RatingBracket::Platinum,
        RatingBracket::Diamond,
        RatingBracket::Master,
        RatingBracket::Grandmaster,
    ];

    pub fn for_rating(rating: f64) -> Self {
        match rating {
            r if r < 1200.0 => RatingBracket::Bronze,
            r if r < 1400.0 => RatingBracket::Silver,
            r if r < 1600.0 => RatingBracket::Gold,
            r if r < 1800.0 => RatingBracket::Platinum,
            r if r < 2000.0 => RatingBracket::Diamond,
            r if r < 2200.0 => RatingBracket::Master,
            _ => RatingBracket::Grandmaster,
        }
    }
}

impl fmt::Display for RatingBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingBracket::Bronze => write!(f, "Bronze (<1200)"),
            RatingBracket::Silver => write!(f, "Silver (1200-1400)"),
            RatingBracket::Gold => write!(f, "Gold (1400-1600)"),
            RatingBracket::Platinum => write!(f, "Platinum (1600-1800)"),
            RatingBracket::Diamond => write!(f, "Diamond (1800-2000)"),
            RatingBracket::Master => write!(f, "Master (2000-2200)"),
            RatingBracket::Grandmaster => write!(f, "Grandmaster (2200+)"),
        }
    }
}

/// Count of ratings in one bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketCount {
    pub bracket: RatingBracket,
    pub count: usize,
}

/// Summary of a set of ratings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingDistribution {
    pub total: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Every bracket in ascending order, including empty ones
    pub brackets: Vec<BracketCount>,
}

impl RatingDistribution {
    /// Summarize ratings; `None` when there are none
    pub fn from_ratings(ratings: &[f64]) -> Option<Self> {
        if ratings.is_empty() {
            return None;
        }

        let total = ratings.len();
        let mean = ratings.iter().sum::<f64>() / total as f64;
        let variance = ratings.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / total as f64;

        let mut sorted = ratings.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if total % 2 == 0 {
            (sorted[total / 2 - 1] + sorted[total / 2]) / 2.0
        } else {
            sorted[total / 2]
        };

        let brackets = RatingBracket::ALL
            .iter()
            .map(|bracket| BracketCount {
                bracket: *bracket,
                count: ratings
                    .iter()
                    .filter(|r| RatingBracket::for_rating(**r) == *bracket)
                    .count(),
            })
            .collect();

        Some(Self {
            total,
            mean,
            median,
            std_dev: variance.max(0.0).sqrt(),
            min: sorted[0],
            max: sorted[total - 1],
            brackets,
        })
    }

    pub fn count_in(&self, bracket: RatingBracket) -> usize {
        self.brackets
            .iter()
            .find(|entry| entry.bracket == bracket)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
