//! Dota ELO - rating engine for Dota 2 players and teams
//!
//! This crate maintains ELO ratings with an experience-dependent K-factor,
//! inactivity decay toward the baseline, tournament tier and stage weighting,
//! and a confidence estimate attached to every prediction.

pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use rating::{InMemoryRatingStore, RatingEngine, RatingStore, RatingUpdate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
