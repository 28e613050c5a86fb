//! Logistic expected-score model shared by the update engine and predictions

/// Conventional logistic scale: a 400 point gap means 10:1 odds
pub const DEFAULT_SCALE: f64 = 400.0;

/// Expected score of A against B.
///
/// `E_A = 1 / (1 + 10^((R_B - R_A) / scale))`
pub fn expected_score(rating_a: f64, rating_b: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / scale))
}

/// Expected scores for both sides. B's score is derived as `1 - E_A` so the
/// pair always sums to exactly one.
pub fn expected_pair(rating_a: f64, rating_b: f64, scale: f64) -> (f64, f64) {
    let expected_a = expected_score(rating_a, rating_b, scale);
    (expected_a, 1.0 - expected_a)
}

/// Rating change for a single side
pub fn rating_delta(k_factor: f64, actual: f64, expected: f64) -> f64 {
    k_factor * (actual - expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use skillratings::elo::EloRating;

    #[test]
    fn test_equal_ratings_are_even() {
        assert_eq!(expected_score(1500.0, 1500.0, DEFAULT_SCALE), 0.5);
    }

    #[test]
    fn test_four_hundred_points_is_ten_to_one() {
        let expected = expected_score(1900.0, 1500.0, DEFAULT_SCALE);
        assert!((expected - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_matches_reference_elo() {
        let a = EloRating { rating: 1830.0 };
        let b = EloRating { rating: 1612.5 };
        let (reference_a, reference_b) = skillratings::elo::expected_score(&a, &b);
        let (ours_a, ours_b) = expected_pair(a.rating, b.rating, DEFAULT_SCALE);

        assert!((reference_a - ours_a).abs() < 1e-9);
        assert!((reference_b - ours_b).abs() < 1e-9);
    }

    #[test]
    fn test_rating_delta_zero_when_result_matches_expectation() {
        assert_eq!(rating_delta(32.0, 0.5, 0.5), 0.0);
        assert_eq!(rating_delta(32.0, 1.0, 0.5), 16.0);
    }

    proptest! {
        #[test]
        fn expected_scores_sum_to_one(
            rating_a in 0.0f64..4000.0,
            rating_b in 0.0f64..4000.0,
            scale in 100.0f64..800.0,
        ) {
            let (expected_a, expected_b) = expected_pair(rating_a, rating_b, scale);
            prop_assert!((expected_a + expected_b - 1.0).abs() < 1e-9);
            prop_assert!((0.0..=1.0).contains(&expected_a));
        }

        #[test]
        fn expected_score_is_symmetric(
            rating_a in 0.0f64..4000.0,
            rating_b in 0.0f64..4000.0,
        ) {
            let forward = expected_score(rating_a, rating_b, DEFAULT_SCALE);
            let backward = expected_score(rating_b, rating_a, DEFAULT_SCALE);
            prop_assert!((forward + backward - 1.0).abs() < 1e-9);
        }
    }
}
