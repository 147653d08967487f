// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================

/// Arithmetic mean of exactly the last `period` values.
///
/// Returns `None` when `period == 0`, when fewer than `period` values exist,
/// or when the mean is non-finite.
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let window = &values[values.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;

    mean.is_finite().then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_insufficient_data() {
        assert!(calculate_sma(&[1.0, 2.0], 3).is_none());
        assert!(calculate_sma(&[], 1).is_none());
    }

    #[test]
    fn sma_period_zero() {
        assert!(calculate_sma(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn sma_uses_trailing_window() {
        // Last three of 1..=10 are 8, 9, 10.
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let sma = calculate_sma(&values, 3).unwrap();
        assert!((sma - 9.0).abs() < 1e-12);
    }

    #[test]
    fn sma_full_length_window() {
        let sma = calculate_sma(&[2.0, 4.0, 6.0, 8.0], 4).unwrap();
        assert!((sma - 5.0).abs() < 1e-12);
    }
}
