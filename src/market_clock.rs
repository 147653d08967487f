// =============================================================================
// Market Clock — exchange session open/closed
// =============================================================================
//
// A session is open when, in the exchange's local time:
//   - the day is Monday..Friday,
//   - the date is not an exchange holiday,
//   - opens <= time <= closes (both bounds inclusive).
//
// The clock never reads the wall clock; `now` is always a parameter.
// =============================================================================

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use serde::Serialize;
use tracing::trace;

use crate::types::MarketStatus;

/// How far ahead `next_open` searches before giving up.
const NEXT_OPEN_SEARCH_DAYS: i64 = 30;

/// India Standard Time, UTC+05:30.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// ---------------------------------------------------------------------------
// Holiday calendar
// ---------------------------------------------------------------------------

/// Source of exchange holidays. Injected into [`MarketClock`].
pub trait HolidayCalendar: Send + Sync {
    /// All known holiday dates for `exchange`.
    fn holidays(&self, exchange: &str) -> BTreeSet<NaiveDate>;

    fn is_holiday(&self, exchange: &str, date: NaiveDate) -> bool {
        self.holidays(exchange).contains(&date)
    }
}

/// In-memory holiday table keyed by exchange name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct StaticHolidayCalendar {
    by_exchange: HashMap<String, BTreeSet<NaiveDate>>,
}

impl StaticHolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(
        mut self,
        exchange: &str,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.by_exchange
            .entry(exchange.to_uppercase())
            .or_default()
            .extend(dates);
        self
    }
}

impl HolidayCalendar for StaticHolidayCalendar {
    fn holidays(&self, exchange: &str) -> BTreeSet<NaiveDate> {
        self.by_exchange
            .get(&exchange.to_uppercase())
            .cloned()
            .unwrap_or_default()
    }

    fn is_holiday(&self, exchange: &str, date: NaiveDate) -> bool {
        self.by_exchange
            .get(&exchange.to_uppercase())
            .is_some_and(|dates| dates.contains(&date))
    }
}

// ---------------------------------------------------------------------------
// Session window
// ---------------------------------------------------------------------------

/// Daily trading window in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub opens: NaiveTime,
    pub closes: NaiveTime,
    pub utc_offset: FixedOffset,
}

impl SessionWindow {
    /// NSE / BSE cash session: 09:15–15:30 IST (UTC+05:30).
    pub fn nse() -> Self {
        Self {
            opens: NaiveTime::from_hms_opt(9, 15, 0).expect("09:15 is a valid time"),
            closes: NaiveTime::from_hms_opt(15, 30, 0).expect("15:30 is a valid time"),
            utc_offset: FixedOffset::east_opt(IST_OFFSET_SECS).expect("+05:30 is a valid offset"),
        }
    }
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self::nse()
    }
}

/// Open and close instants of one session, in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionBounds {
    pub opens_at: DateTime<FixedOffset>,
    pub closes_at: DateTime<FixedOffset>,
}

// ---------------------------------------------------------------------------
// MarketClock
// ---------------------------------------------------------------------------

/// Session clock for one exchange.
#[derive(Clone)]
pub struct MarketClock {
    exchange: String,
    session: SessionWindow,
    calendar: Arc<dyn HolidayCalendar>,
}

impl MarketClock {
    pub fn new(
        exchange: impl Into<String>,
        session: SessionWindow,
        calendar: Arc<dyn HolidayCalendar>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            session,
            calendar,
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn session(&self) -> &SessionWindow {
        &self.session
    }

    /// Exchange-local calendar date of `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.session.utc_offset).date_naive()
    }

    /// Weekday that is not a listed holiday.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
            && !self.calendar.is_holiday(&self.exchange, date)
    }

    /// Whether the session is trading at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.session.utc_offset);
        let date = local.date_naive();
        let time = local.time();

        let open = self.is_trading_day(date)
            && time >= self.session.opens
            && time <= self.session.closes;

        trace!(exchange = %self.exchange, %local, open, "market session check");
        open
    }

    pub fn status(&self, now: DateTime<Utc>) -> MarketStatus {
        MarketStatus::from(self.is_open(now))
    }

    /// Session bounds for the local day of `now`, or `None` when that day has
    /// no session (weekend or holiday).
    pub fn session_bounds(&self, now: DateTime<Utc>) -> Option<SessionBounds> {
        self.bounds_on(self.local_date(now))
    }

    /// First session open strictly after `now`, searching up to 30 days.
    pub fn next_open(&self, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
        let today = self.local_date(now);
        (0..=NEXT_OPEN_SEARCH_DAYS)
            .filter_map(|offset| self.bounds_on(today + Duration::days(offset)))
            .map(|bounds| bounds.opens_at)
            .find(|opens_at| *opens_at > now)
    }

    fn bounds_on(&self, date: NaiveDate) -> Option<SessionBounds> {
        if !self.is_trading_day(date) {
            return None;
        }
        let opens_at = date
            .and_time(self.session.opens)
            .and_local_timezone(self.session.utc_offset)
            .single()?;
        let closes_at = date
            .and_time(self.session.closes)
            .and_local_timezone(self.session.utc_offset)
            .single()?;
        Some(SessionBounds {
            opens_at,
            closes_at,
        })
    }
}

// ---------------------------------------------------------------------------
// ExchangeClocks
// ---------------------------------------------------------------------------

/// Clocks of every configured exchange, addressed by ticker suffix.
#[derive(Debug, Clone)]
pub struct ExchangeClocks {
    primary: MarketClock,
    by_suffix: Vec<(String, MarketClock)>,
}

impl ExchangeClocks {
    /// Only `primary`; every symbol maps to it.
    pub fn new(primary: MarketClock) -> Self {
        Self {
            primary,
            by_suffix: Vec::new(),
        }
    }

    /// Route tickers ending in `suffix` (`.BO`, case-insensitive) to `clock`.
    pub fn with_suffix(mut self, suffix: &str, clock: MarketClock) -> Self {
        let suffix = suffix.trim_start_matches('.').to_uppercase();
        if !suffix.is_empty() {
            self.by_suffix.push((suffix, clock));
        }
        self
    }

    pub fn primary(&self) -> &MarketClock {
        &self.primary
    }

    /// Clock of the exchange listing `symbol`, else the primary clock.
    pub fn for_symbol(&self, symbol: &str) -> &MarketClock {
        symbol
            .rsplit_once('.')
            .and_then(|(_, suffix)| {
                self.by_suffix
                    .iter()
                    .find(|(s, _)| s.eq_ignore_ascii_case(suffix))
            })
            .map_or(&self.primary, |(_, clock)| clock)
    }
}

impl std::fmt::Debug for MarketClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketClock")
            .field("exchange", &self.exchange)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
