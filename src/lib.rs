// =============================================================================
// Stockcast — daily stock analytics and short-horizon forecasts
// =============================================================================
//
// Engine (pure, synchronous):
//   market_data  — validated daily history + live-quote merge
//   indicators   — RSI(14), SMA(50/200), MACD(12,26,9)
//   prediction   — least-squares trend extrapolation
//   market_clock — exchange session open/closed, holidays injected
//
// Edges (async, fallible):
//   providers    — Yahoo chart + Finnhub clients behind traits
//   report       — concurrent fetch, then engine, then payload
// =============================================================================

pub mod indicators;
pub mod market_clock;
pub mod market_data;
pub mod prediction;
pub mod providers;
pub mod report;
pub mod runtime_config;
pub mod symbol;
pub mod types;

pub use indicators::Indicators;
pub use market_clock::{
    ExchangeClocks, HolidayCalendar, MarketClock, SessionWindow, StaticHolidayCalendar,
};
pub use market_data::{merge, History, HistoryError, HistoryPoint};
pub use prediction::{predict, PredictionResult};
pub use report::{MarketOverview, ReportBuilder, StockReport};
pub use runtime_config::EngineConfig;
pub use types::{MarketStatus, NewsItem, Quote, Trend};
