use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One daily OHLCV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Why a point or a series was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: f64 },
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("dates must be strictly ascending: {previous} is followed by {next}")]
    OutOfOrder { previous: NaiveDate, next: NaiveDate },
}

impl HistoryPoint {
    /// Build a validated point. Prices must be finite and non-negative.
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, HistoryError> {
        let point = Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        point.validate()?;
        Ok(point)
    }

    /// A flat candle where every price equals `price` and no volume traded.
    pub(crate) fn flat(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0,
        }
    }

    fn validate(&self) -> Result<(), HistoryError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(HistoryError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(HistoryError::NegativeValue { field, value });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// History -- strictly ascending, date-unique series
// ---------------------------------------------------------------------------

/// Daily price history, oldest first, with at most one point per date.
///
/// The ordering invariant is checked on construction, so every engine
/// operation can rely on it without re-validating.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    points: Vec<HistoryPoint>,
}

impl History {
    /// Wrap `points`, rejecting invalid prices and any date that does not
    /// strictly follow its predecessor.
    pub fn new(points: Vec<HistoryPoint>) -> Result<Self, HistoryError> {
        for point in &points {
            point.validate()?;
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(HistoryError::OutOfOrder {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { points })
    }

    /// Sort `points` by date and keep the last point seen for each date.
    ///
    /// Providers sometimes return the live session twice (once as a daily
    /// row, once as an intraday row), so duplicates are expected here.
    pub fn from_unsorted(mut points: Vec<HistoryPoint>) -> Result<Self, HistoryError> {
        for point in &points {
            point.validate()?;
        }
        // Stable sort keeps arrival order within a date; the later row wins.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<HistoryPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Ok(Self { points: deduped })
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<HistoryPoint> {
        self.points
    }

    /// Closing prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Internal constructor for callers that already hold the invariant.
    pub(crate) fn from_trusted(points: Vec<HistoryPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }
}

impl<'de> Deserialize<'de> for History {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<HistoryPoint>::deserialize(deserializer)?;
        History::new(points).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
