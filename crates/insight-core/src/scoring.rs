//! Shared numeric primitives for agent scoring.
//!
//! Every agent maps raw metrics onto the common [-100, 100] score range
//! through fixed threshold ladders. The threshold values are hand-picked
//! heuristics carried over for behavioral compatibility, not calibrated
//! models; they live with the agents as named constants and are applied
//! through the banding helpers below.

/// Clamp a raw score into the [-100, 100] range.
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(-100.0, 100.0)
}

/// Clamp a raw confidence or weight into the [0, 1] range.
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Mean of a data slice; 0.0 when empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by n).
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Interpolated quantile of a data slice, `q` in [0, 1].
///
/// Linear interpolation between the two nearest order statistics, so a
/// 5% quantile over daily returns matches the usual historical-VaR
/// convention.
pub fn quantile(data: &[f64], q: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = pos - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

/// Map `value` through an ascending "less-than" threshold ladder.
///
/// Returns the score of the first tier whose limit `value` is strictly
/// below, or `fallback` when it clears every tier. Used for
/// lower-is-better metrics (P/E, volatility, leverage).
pub fn band_below(value: f64, tiers: &[(f64, f64)], fallback: f64) -> f64 {
    for &(limit, score) in tiers {
        if value < limit {
            return score;
        }
    }
    fallback
}

/// Map `value` through a descending "greater-than" threshold ladder.
///
/// Returns the score of the first tier whose limit `value` strictly
/// exceeds, or `fallback` when it clears none. Used for
/// higher-is-better metrics (ROE, growth, Sharpe).
pub fn band_above(value: f64, tiers: &[(f64, f64)], fallback: f64) -> f64 {
    for &(limit, score) in tiers {
        if value > limit {
            return score;
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(500.0), 100.0);
        assert_eq!(clamp_score(-500.0), -100.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn test_clamp_unit_bounds() {
        assert_eq!(clamp_unit(-1.0), 0.0);
        assert_eq!(clamp_unit(3.0), 1.0);
        assert_eq!(clamp_unit(0.7), 0.7);
    }

    #[test]
    fn test_mean_and_std() {
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&data) - 5.0).abs() < 1e-9);
        assert!((population_std_dev(&data) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        // position 0.05 * 3 = 0.15 -> between 1.0 and 2.0
        assert!((quantile(&data, 0.05) - 1.15).abs() < 1e-9);
        assert_eq!(quantile(&data, 0.0), 1.0);
        assert_eq!(quantile(&data, 1.0), 4.0);
    }

    #[test]
    fn test_band_below_ladder() {
        let tiers = [(15.0, 60.0), (25.0, 20.0), (35.0, -20.0)];
        assert_eq!(band_below(10.0, &tiers, -60.0), 60.0);
        assert_eq!(band_below(20.0, &tiers, -60.0), 20.0);
        assert_eq!(band_below(30.0, &tiers, -60.0), -20.0);
        assert_eq!(band_below(40.0, &tiers, -60.0), -60.0);
        // exact threshold falls into the next tier
        assert_eq!(band_below(15.0, &tiers, -60.0), 20.0);
    }

    #[test]
    fn test_band_above_ladder() {
        let tiers = [(20.0, 60.0), (15.0, 30.0), (10.0, 10.0)];
        assert_eq!(band_above(25.0, &tiers, -20.0), 60.0);
        assert_eq!(band_above(17.0, &tiers, -20.0), 30.0);
        assert_eq!(band_above(11.0, &tiers, -20.0), 10.0);
        assert_eq!(band_above(5.0, &tiers, -20.0), -20.0);
        // exact threshold falls into the next tier
        assert_eq!(band_above(20.0, &tiers, -20.0), 30.0);
    }
}
