// =============================================================================
// Moving Average Convergence-Divergence (MACD)
// =============================================================================
//
//   line      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal) of the line
//   histogram = line - signal
//
// The fast EMA starts `slow - fast` closes earlier than the slow one, so the
// two series are aligned on the slow EMA's first index before subtracting.
// The first signal value needs `slow + signal - 1` closes.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::ema::calculate_ema;

/// Latest MACD reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line series, aligned to the slow EMA (one value per close from index
/// `slow - 1`). Empty when `fast >= slow` or data is short.
pub fn macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    if fast == 0 || fast >= slow {
        return Vec::new();
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    let offset = slow - fast;

    // A truncated fast series (non-finite input) shortens the line too.
    slow_ema
        .iter()
        .zip(fast_ema.iter().skip(offset))
        .map(|(slow_v, fast_v)| fast_v - slow_v)
        .collect()
}

/// Latest MACD line, signal and histogram.
///
/// Returns `None` until at least one signal value exists, i.e. with fewer
/// than `slow + signal - 1` closes.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if signal == 0 || closes.len() + 1 < slow + signal {
        return None;
    }

    let line = macd_line(closes, fast, slow);
    let signal_series = calculate_ema(&line, signal);

    let line_now = *line.last()?;
    let signal_now = *signal_series.last()?;

    Some(MacdValue {
        line: line_now,
        signal: signal_now,
        histogram: line_now - signal_now,
    })
}
