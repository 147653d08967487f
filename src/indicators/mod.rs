// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions over closing prices. Every
// reading is an `Option` so that a short history surfaces as an absent field
// rather than a silently wrong number.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::market_data::History;

pub use macd::MacdValue;

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT: usize = 50;
pub const SMA_LONG: usize = 200;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Latest indicator readings for one history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub rsi: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub macd: Option<MacdValue>,
}

/// Compute RSI(14), SMA(50), SMA(200) and MACD(12,26,9) from the closes of
/// `history`.
pub fn compute(history: &History) -> Indicators {
    let closes = history.closes();

    let indicators = Indicators {
        rsi: rsi::latest_rsi(&closes, RSI_PERIOD),
        sma50: sma::calculate_sma(&closes, SMA_SHORT),
        sma200: sma::calculate_sma(&closes, SMA_LONG),
        macd: macd::calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
    };

    trace!(
        closes = closes.len(),
        rsi = ?indicators.rsi,
        sma50 = ?indicators.sma50,
        sma200 = ?indicators.sma200,
        has_macd = indicators.macd.is_some(),
        "indicators computed"
    );

    indicators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::HistoryPoint;
    use chrono::{Duration, NaiveDate};

    fn history_from(closes: &[f64]) -> History {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                HistoryPoint::new(start + Duration::days(i as i64), c, c, c, c, 0).unwrap()
            })
            .collect();
        History::new(points).unwrap()
    }

    /// Deterministic wavy series so averages are not trivially equal.
    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 500.0 + 40.0 * (i as f64 * 0.37).sin() + i as f64 * 0.25)
            .collect()
    }

    #[test]
    fn short_history_has_no_rsi() {
        for n in 0..15 {
            let ind = compute(&history_from(&wavy(n)));
            assert!(ind.rsi.is_none(), "len {n}");
        }
        assert!(compute(&history_from(&wavy(15))).rsi.is_some());
    }

    #[test]
    fn sma200_is_mean_of_last_200() {
        let closes = wavy(260);
        let ind = compute(&history_from(&closes));

        let mut expected = 0.0;
        for c in &closes[60..] {
            expected += c;
        }
        expected /= 200.0;

        let sma200 = ind.sma200.unwrap();
        assert!((sma200 - expected).abs() < 1e-9, "{sma200} vs {expected}");
    }

    #[test]
    fn sma_fields_follow_length() {
        let ind = compute(&history_from(&wavy(120)));
        assert!(ind.sma50.is_some());
        assert!(ind.sma200.is_none());

        let ind = compute(&history_from(&wavy(49)));
        assert!(ind.sma50.is_none());
    }

    #[test]
    fn macd_appears_at_34_closes() {
        assert!(compute(&history_from(&wavy(33))).macd.is_none());
        assert!(compute(&history_from(&wavy(34))).macd.is_some());
    }

    #[test]
    fn rsi_within_bounds() {
        let rsi = compute(&history_from(&wavy(300))).rsi.unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }

    #[test]
    fn empty_history_is_all_absent() {
        assert_eq!(compute(&History::default()), Indicators::default());
    }

    #[test]
    fn absent_fields_serialise_as_null() {
        let json = serde_json::to_value(compute(&history_from(&wavy(20)))).unwrap();
        assert!(json["rsi"].is_number());
        assert!(json["sma50"].is_null());
        assert!(json["macd"].is_null());
    }
}
