//! ELO rating engine
//!
//! Pure policies (expected score, K-factor, weighting, decay, confidence)
//! plus the store and the engine that ties them together.

pub mod confidence;
pub mod decay;
pub mod elo;
pub mod engine;
pub mod k_factor;
pub mod locks;
pub mod statistics;
pub mod storage;
pub mod weighting;

// Re-export commonly used types
pub use confidence::{ConfidenceConfig, ConfidenceEstimator};
pub use decay::{DecayConfig, DecayMode, DecayPolicy};
pub use engine::{EngineStats, RatingEngine, RatingUpdate, ReplaySummary, SweepReport};
pub use k_factor::{KFactorConfig, KFactorPolicy};
pub use statistics::{RatingBracket, RatingDistribution};
pub use storage::{InMemoryRatingStore, MockRatingStore, RatingStore};
pub use weighting::{MatchWeighting, WeightingConfig};
