// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
//   k     = 2 / (period + 1)
//   EMA_t = value_t * k + EMA_{t-1} * (1 - k)
//
// Seeded with the simple average of the first `period` values, so the first
// output lines up with input index `period - 1`.
// =============================================================================

/// Compute the EMA series of `values` for `period`.
///
/// Output element `i` corresponds to input index `period - 1 + i`, so the
/// result has `values.len() - period + 1` elements.
///
/// # Edge cases
/// - `period == 0` or `values.len() < period` => empty vec
/// - A non-finite seed => empty vec
/// - A non-finite step truncates the series at that point
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);

    let mut prev = seed;
    for &value in &values[period..] {
        let next = value * k + prev * (1.0 - k);
        if !next.is_finite() {
            break;
        }
        series.push(next);
        prev = next;
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 30 daily closes with a dip and recovery, as a MACD input would see.
    fn closes() -> Vec<f64> {
        (0..30)
            .map(|i| 800.0 + 6.0 * i as f64 - if (10..15).contains(&i) { 40.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn slow_period_longer_than_history_is_empty() {
        assert!(calculate_ema(&closes()[..25], 26).is_empty());
        assert!(calculate_ema(&closes(), 0).is_empty());
    }

    #[test]
    fn seed_is_mean_of_first_period_closes() {
        let closes = closes();
        let fast = calculate_ema(&closes, 12);
        let seed = closes[..12].iter().sum::<f64>() / 12.0;
        assert!((fast[0] - seed).abs() < 1e-9);
    }

    #[test]
    fn fast_and_slow_lengths_line_up_for_macd() {
        let closes = closes();
        let fast = calculate_ema(&closes, 12);
        let slow = calculate_ema(&closes, 26);
        assert_eq!(fast.len(), 19);
        assert_eq!(slow.len(), 5);
        // Dropping `slow - fast` leading fast values aligns the two series.
        assert_eq!(fast.len() - (26 - 12), slow.len());
    }

    #[test]
    fn recursion_uses_two_over_period_plus_one() {
        let closes = closes();
        let slow = calculate_ema(&closes, 26);
        let k = 2.0 / 27.0;
        for (step, &close) in closes[26..].iter().enumerate() {
            let expected = close * k + slow[step] * (1.0 - k);
            assert!((slow[step + 1] - expected).abs() < 1e-9, "step {step}");
        }
    }

    #[test]
    fn ema_lags_a_rising_series() {
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let ema = calculate_ema(&rising, 9);
        assert!(ema.iter().zip(&rising[8..]).all(|(e, c)| e <= c));
    }

    #[test]
    fn non_finite_close_truncates_the_series() {
        let mut closes = closes();
        closes[20] = f64::INFINITY;
        assert_eq!(calculate_ema(&closes, 12).len(), 20 - 12 + 1);

        closes[3] = f64::NAN;
        assert!(calculate_ema(&closes, 12).is_empty());
    }
}
