// =============================================================================
// Live quote -> history reconciliation
// =============================================================================
//
// Daily history from the provider lags the live session: today's row is
// either missing or carries a stale close. `merge` folds the live quote into
// the series so indicators and the forecast see the current price.
//
//   last.date == today   => replace last.close with the quote price
//   last.date <  today   => append a flat candle at the quote price
//   price missing / <= 0 => no update
// =============================================================================

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::market_data::history::{History, HistoryPoint};
use crate::types::Quote;

/// Return a copy of `history` whose last point reflects `quote` for `today`.
///
/// Open, high, low and volume of an existing "today" row are kept: they still
/// describe the recorded session range. A history whose last date is later
/// than `today` is returned unchanged so the ordering never breaks.
pub fn merge(history: &History, quote: &Quote, today: NaiveDate) -> History {
    let price = quote.price;
    let usable = price.is_finite() && price > 0.0;
    let mut points = history.points().to_vec();

    match points.last().map(|p| p.date) {
        Some(last_date) if last_date == today => {
            if let (true, Some(last)) = (usable, points.last_mut()) {
                debug!(
                    symbol = %quote.symbol,
                    %today,
                    previous_close = last.close,
                    live = price,
                    "replacing today's close with live price"
                );
                last.close = price;
            } else {
                trace!(symbol = %quote.symbol, "no usable live price, keeping recorded close");
            }
        }
        Some(last_date) if last_date > today => {
            trace!(
                symbol = %quote.symbol,
                last = %last_date,
                %today,
                "history already runs past today, leaving it as is"
            );
        }
        _ if usable => {
            debug!(symbol = %quote.symbol, %today, live = price, "appending live candle");
            points.push(HistoryPoint::flat(today, price));
        }
        _ => {
            trace!(symbol = %quote.symbol, "no usable live price, history unchanged");
        }
    }

    History::from_trusted(points)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
