//! Metrics for the rating engine
//!
//! Prometheus counters describing what the engine accepted, rejected and
//! served. The engine records into a collector only when one is attached.

pub mod collector;

pub use collector::RatingMetrics;
