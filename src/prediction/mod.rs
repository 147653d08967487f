// =============================================================================
// Short-horizon Price Forecast
// =============================================================================
//
// Deterministic linear extrapolation, anchored to the live price:
//
//   1. Fit OLS of close vs. index over the last REGRESSION_WINDOW closes.
//   2. next_day        = current_price + slope
//      next_5_days[k]  = next_5_days[k-1] + slope, next_5_days[0] = next_day
//   3. trend           = sign(next_day - current_price)
//   4. confidence      = R² of the fit, in [0, 1]
//
// Anchoring to the live price keeps the forecast continuous with what the
// dashboard shows, whatever the regression intercept says.
// =============================================================================

pub mod regression;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::market_data::History;
use crate::types::Trend;

pub use regression::LinearFit;

/// Number of most recent closes the trend line is fitted to.
pub const REGRESSION_WINDOW: usize = 60;

/// Number of projected steps in `next_5_days`.
pub const FORECAST_HORIZON: usize = 5;

/// Forecast for the next trading day and the next five.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub next_day: f64,
    pub next_5_days: [f64; FORECAST_HORIZON],
    pub trend: Trend,
    pub confidence: f64,
}

impl PredictionResult {
    /// Flat, zero-confidence forecast used when there is nothing to fit.
    pub fn neutral(current_price: f64) -> Self {
        Self {
            next_day: current_price,
            next_5_days: [current_price; FORECAST_HORIZON],
            trend: Trend::Neutral,
            confidence: 0.0,
        }
    }
}

/// Project `current_price` forward along the trend of `history`.
///
/// Never fails: fewer than two closes yield [`PredictionResult::neutral`].
pub fn predict(history: &History, current_price: f64) -> PredictionResult {
    let closes = history.closes();
    let window = &closes[closes.len().saturating_sub(REGRESSION_WINDOW)..];

    let Some(fit) = LinearFit::fit(window) else {
        trace!(closes = closes.len(), "not enough closes to fit, neutral forecast");
        return PredictionResult::neutral(current_price);
    };

    let slope = fit.slope;
    let next_day = current_price + slope;

    let mut next_5_days = [next_day; FORECAST_HORIZON];
    for k in 1..FORECAST_HORIZON {
        next_5_days[k] = next_5_days[k - 1] + slope;
    }

    let trend = if next_day > current_price {
        Trend::Up
    } else if next_day < current_price {
        Trend::Down
    } else {
        Trend::Neutral
    };

    trace!(
        window = window.len(),
        slope,
        r_squared = fit.r_squared,
        %trend,
        "forecast computed"
    );

    PredictionResult {
        next_day,
        next_5_days,
        trend,
        confidence: fit.r_squared,
    }
}
