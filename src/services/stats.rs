/// Summary statistics for per-frame metric series.
///
/// Percentiles use linear interpolation between closest ranks, so a low or
/// high percentile stays robust to single-frame detection noise where a raw
/// min/max would not. An empty series summarizes to 0.0; callers only take
/// that path for optional metrics whose score then falls through the
/// threshold tables unchanged.

/// Percentile of `values` in [0, 100] with linear interpolation.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let weight = rank - lo as f64;
        sorted[lo] * (1.0 - weight) + sorted[hi] * weight
    }
}

/// Median of `values`; 0.0 for an empty series.
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Sample standard deviation (n - 1 denominator); 0.0 with fewer than two
/// samples.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values: Vec<f64> = (0..=10).map(|v| v as f64).collect();
        assert_eq!(percentile(&values, 10.0), 1.0);
        assert_eq!(percentile(&values, 90.0), 9.0);
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn test_empty_series_summarizes_to_zero() {
        assert_eq!(percentile(&[], 10.0), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(sample_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_sample_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std_dev(&values);
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        assert_eq!(sample_std_dev(&[5.0]), 0.0);
    }

    proptest! {
        #[test]
        fn prop_percentile_order_invariant(
            mut values in proptest::collection::vec(-1e6f64..1e6, 1..64),
            pct in 0.0f64..100.0,
        ) {
            let forward = percentile(&values, pct);
            values.reverse();
            let reversed = percentile(&values, pct);
            prop_assert_eq!(forward, reversed);
        }

        #[test]
        fn prop_median_within_range(
            values in proptest::collection::vec(-1e6f64..1e6, 1..64),
        ) {
            let m = median(&values);
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= min && m <= max);
        }
    }
}
