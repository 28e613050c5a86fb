//! Error types for the rating engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Callers that need to tell failures apart downcast to
//! [`RatingError`].

use chrono::{DateTime, Utc};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid match: {reason}")]
    InvalidMatch { reason: String },

    #[error("Out of order match for {entity_id}: match at {match_time} precedes last recorded {last_recorded}")]
    OutOfOrderMatch {
        entity_id: String,
        match_time: DateTime<Utc>,
        last_recorded: DateTime<Utc>,
    },

    #[error("Invalid rating for {entity_id}: {value}")]
    InvalidRating { entity_id: String, value: f64 },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl RatingError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            RatingError::InvalidMatch { .. } => "invalid_match",
            RatingError::OutOfOrderMatch { .. } => "out_of_order",
            RatingError::InvalidRating { .. } => "invalid_rating",
            RatingError::ConfigurationError { .. } => "configuration",
            RatingError::InternalError { .. } => "internal",
        }
    }
}

/// Classify an error returned by the crate, if it originated here
pub fn classify(err: &anyhow::Error) -> Option<&RatingError> {
    err.downcast_ref::<RatingError>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_roundtrip() {
        let err: anyhow::Error = RatingError::InvalidMatch {
            reason: "self match".to_string(),
        }
        .into();

        let classified = classify(&err).unwrap();
        assert_eq!(classified.kind(), "invalid_match");
        assert_eq!(err.to_string(), "Invalid match: self match");
    }

    #[test]
    fn test_foreign_error_is_unclassified() {
        let err = anyhow::anyhow!("something else");
        assert!(classify(&err).is_none());
    }
}
