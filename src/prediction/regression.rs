// =============================================================================
// Ordinary Least Squares over a 0-based time index
// =============================================================================
//
//   x_i   = i  (0, 1, ..., n-1)
//   slope = Σ((x-x̄)(y-ȳ)) / Σ((x-x̄)²)
//   R²    = 1 - SS_res / SS_tot
//
// A flat series has no trend to explain: slope and R² are both reported as 0.
// Flatness is judged relative to the series magnitude (SS_tot against
// n·ȳ²), so a genuine trend on tiny prices still counts.

/// Per-step slope of the fitted line and its coefficient of determination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    /// Clamped to `[0, 1]`.
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit `values` against their index. Returns `None` with fewer than two
    /// values or when any sum is non-finite.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut sxy = 0.0_f64;
        let mut sxx = 0.0_f64;
        let mut ss_tot = 0.0_f64;
        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            let dy = y - y_mean;
            sxy += dx * dy;
            sxx += dx * dx;
            ss_tot += dy * dy;
        }

        if !(sxy.is_finite() && ss_tot.is_finite()) || sxx <= 0.0 {
            return None;
        }

        if ss_tot <= f64::EPSILON * n * y_mean * y_mean {
            return Some(Self {
                slope: 0.0,
                r_squared: 0.0,
            });
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let fitted = intercept + slope * i as f64;
                (y - fitted).powi(2)
            })
            .sum();

        let r_squared = (1.0 - ss_res / ss_tot).clamp(0.0, 1.0);

        Some(Self { slope, r_squared })
    }
}
