// =============================================================================
// Engine Configuration — JSON settings with atomic save
// =============================================================================
//
// Every tunable that is not a fixed engine constant lives here: exchange
// sessions and holiday lists, provider endpoints, the overview watch-list.
//
// All fields carry `#[serde(default)]` so a partial file (or `{}`) loads.
// API keys are never stored here; they come from the environment.
//
// =============================================================================

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_clock::{ExchangeClocks, MarketClock, SessionWindow, StaticHolidayCalendar};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_suffix() -> String {
    ".NS".to_string()
}

fn default_primary_exchange() -> String {
    "NSE".to_string()
}

fn default_exchanges() -> Vec<ExchangeConfig> {
    vec![
        ExchangeConfig::indian("NSE", ".NS"),
        ExchangeConfig::indian("BSE", ".BO"),
    ]
}

fn default_overview_symbols() -> Vec<String> {
    [
        "SBIN.NS",
        "HDFCBANK.NS",
        "RELIANCE.NS",
        "TCS.NS",
        "INFY.NS",
        "ICICIBANK.NS",
        "AXISBANK.NS",
        "WIPRO.NS",
        "BHARTIARTL.NS",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_history_range() -> String {
    "1y".to_string()
}

fn default_news_limit() -> usize {
    10
}

fn default_news_lookback_days() -> i64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_finnhub_base_url() -> String {
    "https://finnhub.io".to_string()
}

fn default_google_news_base_url() -> String {
    "https://news.google.com".to_string()
}

fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_session_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 15, 0).unwrap_or_default()
}

fn default_session_close() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 30, 0).unwrap_or_default()
}

/// Fixed-date exchange holidays; movable festivals belong in the config file.
fn default_indian_holidays() -> Vec<NaiveDate> {
    [(1, 26), (5, 1), (10, 2), (12, 25)]
        .into_iter()
        .filter_map(|(m, d)| NaiveDate::from_ymd_opt(2026, m, d))
        .collect()
}

// =============================================================================
// ExchangeConfig
// =============================================================================

/// Session hours and holidays of one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,

    /// Ticker suffix addressing this exchange on the quote provider.
    #[serde(default)]
    pub suffix: String,

    /// Exchange-local offset from UTC, in minutes (IST = 330).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_session_open")]
    pub session_open: NaiveTime,

    #[serde(default = "default_session_close")]
    pub session_close: NaiveTime,

    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl ExchangeConfig {
    fn indian(name: &str, suffix: &str) -> Self {
        Self {
            name: name.to_string(),
            suffix: suffix.to_string(),
            utc_offset_minutes: default_utc_offset_minutes(),
            session_open: default_session_open(),
            session_close: default_session_close(),
            holidays: default_indian_holidays(),
        }
    }

    pub fn session_window(&self) -> Result<SessionWindow> {
        let utc_offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow!(
                "exchange {}: utc_offset_minutes {} is out of range",
                self.name,
                self.utc_offset_minutes
            )
        })?;
        if self.session_close <= self.session_open {
            return Err(anyhow!(
                "exchange {}: session_close {} must be after session_open {}",
                self.name,
                self.session_close,
                self.session_open
            ));
        }
        Ok(SessionWindow {
            opens: self.session_open,
            closes: self.session_close,
            utc_offset,
        })
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Suffix appended to bare tickers (`SBIN` -> `SBIN.NS`).
    #[serde(default = "default_suffix")]
    pub default_suffix: String,

    /// Exchange whose clock drives `market_status` and the report's "today".
    #[serde(default = "default_primary_exchange")]
    pub primary_exchange: String,

    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<ExchangeConfig>,

    /// Watch-list for the market overview.
    #[serde(default = "default_overview_symbols")]
    pub overview_symbols: Vec<String>,

    // --- Providers ----------------------------------------------------------

    /// Yahoo chart `range` for daily history (e.g. `6mo`, `1y`, `2y`).
    #[serde(default = "default_history_range")]
    pub history_range: String,

    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    #[serde(default = "default_news_lookback_days")]
    pub news_lookback_days: i64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    #[serde(default = "default_finnhub_base_url")]
    pub finnhub_base_url: String,

    #[serde(default = "default_google_news_base_url")]
    pub google_news_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_suffix: default_suffix(),
            primary_exchange: default_primary_exchange(),
            exchanges: default_exchanges(),
            overview_symbols: default_overview_symbols(),
            history_range: default_history_range(),
            news_limit: default_news_limit(),
            news_lookback_days: default_news_lookback_days(),
            request_timeout_secs: default_request_timeout_secs(),
            yahoo_base_url: default_yahoo_base_url(),
            finnhub_base_url: default_finnhub_base_url(),
            google_news_base_url: default_google_news_base_url(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            primary_exchange = %config.primary_exchange,
            exchanges = config.exchanges.len(),
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist to `path` atomically (write `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise engine config")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }

    /// Case-insensitive lookup of an exchange by name.
    pub fn exchange(&self, name: &str) -> Option<&ExchangeConfig> {
        self.exchanges
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Holiday table covering every configured exchange.
    pub fn holiday_calendar(&self) -> StaticHolidayCalendar {
        self.exchanges
            .iter()
            .fold(StaticHolidayCalendar::new(), |calendar, exchange| {
                calendar.with_holidays(&exchange.name, exchange.holidays.iter().copied())
            })
    }

    /// Clock for the exchange called `name`.
    pub fn market_clock(&self, name: &str) -> Result<MarketClock> {
        let exchange = self
            .exchange(name)
            .ok_or_else(|| anyhow!("exchange {name} is not configured"))?;
        let session = exchange.session_window()?;
        Ok(MarketClock::new(
            exchange.name.clone(),
            session,
            Arc::new(self.holiday_calendar()),
        ))
    }

    /// Clock for [`EngineConfig::primary_exchange`].
    pub fn primary_clock(&self) -> Result<MarketClock> {
        self.market_clock(&self.primary_exchange)
    }

    /// Clocks of every configured exchange, keyed by suffix, with the
    /// primary exchange as the fallback.
    pub fn exchange_clocks(&self) -> Result<ExchangeClocks> {
        let mut clocks = ExchangeClocks::new(self.primary_clock()?);
        for exchange in &self.exchanges {
            clocks = clocks.with_suffix(&exchange.suffix, self.market_clock(&exchange.name)?);
        }
        Ok(clocks)
    }

    /// Clock of the exchange listing `symbol`; bare or unknown suffixes use
    /// the primary exchange.
    pub fn clock_for_symbol(&self, symbol: &str) -> Result<MarketClock> {
        Ok(self.exchange_clocks()?.for_symbol(symbol).clone())
    }

    /// Configured ticker suffixes in listing-preference order (`.NS`, `.BO`).
    pub fn listing_suffixes(&self) -> Vec<String> {
        self.exchanges
            .iter()
            .filter(|e| !e.suffix.is_empty())
            .map(|e| e.suffix.clone())
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.default_suffix, ".NS");
        assert_eq!(cfg.primary_exchange, "NSE");
        assert_eq!(cfg.exchanges.len(), 2);
        assert_eq!(cfg.exchanges[1].suffix, ".BO");
        assert_eq!(cfg.overview_symbols.len(), 9);
        assert_eq!(cfg.overview_symbols[0], "SBIN.NS");
        assert_eq!(cfg.news_limit, 10);
        assert_eq!(cfg.history_range, "1y");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.primary_exchange, "NSE");
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.exchanges[0].utc_offset_minutes, 330);
    }

    #[test]
    fn deserialise_partial_exchange_fills_defaults() {
        let json = r#"{
            "primary_exchange": "nse",
            "exchanges": [
                { "name": "NSE", "suffix": ".NS", "holidays": ["2026-03-03"] }
            ]
        }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        let nse = cfg.exchange("NSE").unwrap();
        assert_eq!(nse.session_open, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(nse.holidays, vec![NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()]);
        assert!(cfg.exchange("BSE").is_none());
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.exchanges, cfg2.exchanges);
        assert_eq!(cfg.overview_symbols, cfg2.overview_symbols);
    }

    #[test]
    fn clock_honours_configured_holidays() {
        let json = r#"{
            "exchanges": [
                { "name": "NSE", "holidays": ["2026-03-03"], "session_open": "09:15:00", "session_close": "15:30:00" }
            ]
        }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        let clock = cfg.primary_clock().unwrap();

        // Tuesday 2026-03-03 05:00 UTC = 10:30 IST, configured holiday.
        assert!(!clock.is_open(Utc.with_ymd_and_hms(2026, 3, 3, 5, 0, 0).unwrap()));
        // Wednesday 2026-03-04, same time.
        assert!(clock.is_open(Utc.with_ymd_and_hms(2026, 3, 4, 5, 0, 0).unwrap()));
    }

    #[test]
    fn clock_follows_symbol_suffix() {
        let json = r#"{
            "exchanges": [
                { "name": "NSE", "suffix": ".NS" },
                { "name": "BSE", "suffix": ".BO", "holidays": ["2026-03-04"] }
            ]
        }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        // Wednesday 2026-03-04, 10:30 IST: a BSE-only holiday.
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 0, 0).unwrap();

        let bse = cfg.clock_for_symbol("RELIANCE.BO").unwrap();
        assert_eq!(bse.exchange(), "BSE");
        assert!(!bse.is_open(now));

        let nse = cfg.clock_for_symbol("reliance.ns").unwrap();
        assert_eq!(nse.exchange(), "NSE");
        assert!(nse.is_open(now));

        // Bare and foreign tickers use the primary exchange.
        assert_eq!(cfg.clock_for_symbol("AAPL").unwrap().exchange(), "NSE");
        assert_eq!(cfg.clock_for_symbol("VOD.L").unwrap().exchange(), "NSE");
    }

    #[test]
    fn listing_suffixes_follow_exchange_order() {
        assert_eq!(EngineConfig::default().listing_suffixes(), vec![".NS", ".BO"]);
    }

    #[test]
    fn unknown_exchange_is_an_error() {
        assert!(EngineConfig::default().market_clock("LSE").is_err());
    }

    #[test]
    fn inverted_session_is_rejected() {
        let mut exchange = ExchangeConfig::indian("NSE", ".NS");
        exchange.session_close = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(exchange.session_window().is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("stockcast_cfg_{}.json", std::process::id()));
        let mut cfg = EngineConfig::default();
        cfg.news_limit = 3;
        cfg.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.news_limit, 3);
        let _ = std::fs::remove_file(&path);
    }
}
