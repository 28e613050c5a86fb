//! Utility functions for the rating engine

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Whole days elapsed from `from` to `to`, zero if `to` is earlier
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    to.signed_duration_since(from).num_days().max(0)
}

/// Normalize a tier or stage tag for table lookups.
///
/// "Grand Final", "grand-final" and "GRAND_FINAL" all map to "grand_final".
pub fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_days_between() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(days_between(start, start + Duration::hours(47)), 1);
        assert_eq!(days_between(start, start + Duration::days(400)), 400);
        assert_eq!(days_between(start + Duration::days(3), start), 0);
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Grand Final"), "grand_final");
        assert_eq!(normalize_tag(" grand-final "), "grand_final");
        assert_eq!(normalize_tag("TI"), "ti");
        assert_eq!(normalize_tag(""), "");
    }
}
