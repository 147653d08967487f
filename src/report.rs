// =============================================================================
// Stock Report & Market Overview
// =============================================================================
//
// Glue between the providers and the pure engine:
//
//   history ─┐
//   quote  ──┼─> merge(today) ─> compute / predict ─> StockReport
//   news   ──┘
//
// Providers are queried concurrently. Any single failure fails the report;
// there are no retries and no partial payloads.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::indicators::{self, Indicators};
use crate::market_clock::{ExchangeClocks, MarketClock};
use crate::market_data::{merge, History};
use crate::prediction::{self, PredictionResult};
use crate::providers::{HistoryProvider, NewsProvider, QuoteProvider};
use crate::symbol::{currency_symbol, display_label};
use crate::types::{MarketStatus, NewsItem, Quote, Trend};

// ---------------------------------------------------------------------------
// StockReport
// ---------------------------------------------------------------------------

/// Everything the dashboard shows for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub symbol: String,
    pub currency: String,
    pub currency_symbol: String,
    pub exchange_name: String,
    pub market_status: MarketStatus,
    pub quote: Quote,
    /// Daily history with today's live price folded in.
    pub history: History,
    pub indicators: Indicators,
    pub prediction: PredictionResult,
    pub news: Vec<NewsItem>,
}

/// Assemble a report from already-resolved inputs. Pure apart from logging.
///
/// "Today" is the exchange-local date of `now`, so an evening request in UTC
/// still lands on the right trading day.
pub fn assemble(
    symbol: &str,
    history: &History,
    quote: Quote,
    news: Vec<NewsItem>,
    clock: &MarketClock,
    now: DateTime<Utc>,
) -> StockReport {
    let today = clock.local_date(now);
    let merged = merge(history, &quote, today);

    let indicators = indicators::compute(&merged);

    let anchor = if quote.price.is_finite() && quote.price > 0.0 {
        quote.price
    } else {
        merged.last().map_or(0.0, |p| p.close)
    };
    let prediction = prediction::predict(&merged, anchor);

    debug!(
        symbol,
        %today,
        points = merged.len(),
        trend = %prediction.trend,
        confidence = prediction.confidence,
        "report assembled"
    );

    StockReport {
        symbol: symbol.to_string(),
        currency: quote.currency.clone(),
        currency_symbol: currency_symbol(&quote.currency),
        exchange_name: quote.exchange_name.clone(),
        market_status: clock.status(now),
        quote,
        history: merged,
        indicators,
        prediction,
        news,
    }
}

/// Fetches the three inputs of a report and assembles it on the clock of
/// the exchange listing the symbol.
pub struct ReportBuilder {
    history: Arc<dyn HistoryProvider>,
    quotes: Arc<dyn QuoteProvider>,
    news: Arc<dyn NewsProvider>,
    clocks: ExchangeClocks,
}

impl ReportBuilder {
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        quotes: Arc<dyn QuoteProvider>,
        news: Arc<dyn NewsProvider>,
        clocks: ExchangeClocks,
    ) -> Self {
        Self {
            history,
            quotes,
            news,
            clocks,
        }
    }

    #[instrument(skip(self, now), name = "report::build")]
    pub async fn build(&self, symbol: &str, now: DateTime<Utc>) -> Result<StockReport> {
        let (history, quote, news) = tokio::try_join!(
            async {
                self.history
                    .history(symbol)
                    .await
                    .with_context(|| format!("failed to fetch history for {symbol}"))
            },
            async {
                self.quotes
                    .quote(symbol)
                    .await
                    .with_context(|| format!("failed to fetch quote for {symbol}"))
            },
            async {
                self.news
                    .news(symbol)
                    .await
                    .with_context(|| format!("failed to fetch news for {symbol}"))
            },
        )?;

        let clock = self.clocks.for_symbol(symbol);
        let report = assemble(symbol, &history, quote, news, clock, now);
        info!(
            symbol,
            price = report.quote.price,
            next_day = report.prediction.next_day,
            exchange = clock.exchange(),
            status = %report.market_status,
            "stock report ready"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// MarketOverview
// ---------------------------------------------------------------------------

/// One row of the overview ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewEntry {
    /// Ticker without exchange suffix.
    pub symbol: String,
    pub current_price: f64,
    /// Daily change in percent, rounded to two decimals.
    pub change_percent: f64,
    pub trend: Trend,
}

impl From<&Quote> for OverviewEntry {
    fn from(quote: &Quote) -> Self {
        let change = quote.change_percent.filter(|c| c.is_finite()).unwrap_or(0.0);
        Self {
            symbol: display_label(&quote.symbol).to_string(),
            current_price: quote.price,
            change_percent: (change * 100.0).round() / 100.0,
            trend: if change >= 0.0 { Trend::Up } else { Trend::Down },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    pub quotes: Vec<OverviewEntry>,
    pub market_status: MarketStatus,
}

/// Quote every symbol of the watch-list concurrently. Entries keep the order
/// of `symbols`.
#[instrument(skip_all, fields(symbols = symbols.len()))]
pub async fn market_overview(
    quotes: &dyn QuoteProvider,
    clock: &MarketClock,
    symbols: &[String],
    now: DateTime<Utc>,
) -> Result<MarketOverview> {
    let fetched = try_join_all(symbols.iter().map(|symbol| async move {
        quotes
            .quote(symbol)
            .await
            .with_context(|| format!("failed to fetch overview quote for {symbol}"))
    }))
    .await?;

    let overview = MarketOverview {
        quotes: fetched.iter().map(OverviewEntry::from).collect(),
        market_status: clock.status(now),
    };
    info!(
        entries = overview.quotes.len(),
        status = %overview.market_status,
        "market overview ready"
    );
    Ok(overview)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_clock::{SessionWindow, StaticHolidayCalendar};
    use crate::market_data::HistoryPoint;
    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn clock() -> MarketClock {
        MarketClock::new(
            "NSE",
            SessionWindow::nse(),
            Arc::new(StaticHolidayCalendar::new()),
        )
    }

    /// Mon 2026-02-23 .. Fri 2026-02-27.
    fn week() -> History {
        let closes = [100.0, 102.0, 101.0, 105.0, 107.0];
        History::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| HistoryPoint::new(date(2, 23 + i as u32), c, c, c, c, 1_000).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn quote(symbol: &str, price: f64, change: Option<f64>) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change_percent: change,
            currency: "INR".into(),
            exchange_name: "NSE".into(),
        }
    }

    /// Monday 2026-03-02, 10:30 IST.
    fn monday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap()
    }

    struct StaticHistory(History);

    #[async_trait]
    impl HistoryProvider for StaticHistory {
        async fn history(&self, _symbol: &str) -> Result<History> {
            Ok(self.0.clone())
        }
    }

    struct StaticQuotes;

    #[async_trait]
    impl QuoteProvider for StaticQuotes {
        async fn quote(&self, symbol: &str) -> Result<Quote> {
            match symbol {
                "SBIN.NS" | "SBIN.BO" => Ok(quote(symbol, 110.0, Some(2.804))),
                "TCS.NS" => Ok(quote(symbol, 3900.0, Some(-1.005))),
                "FLAT.NS" => Ok(quote(symbol, 50.0, None)),
                other => bail!("unknown symbol {other}"),
            }
        }
    }

    struct Headlines;

    #[async_trait]
    impl NewsProvider for Headlines {
        async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
            Ok(vec![NewsItem {
                title: format!("{symbol} in focus"),
                link: "https://example.com/n".into(),
                published_at: monday_morning(),
                source: "Wire".into(),
            }])
        }
    }

    struct BrokenNews;

    #[async_trait]
    impl NewsProvider for BrokenNews {
        async fn news(&self, _symbol: &str) -> Result<Vec<NewsItem>> {
            bail!("news api down")
        }
    }

    #[test]
    fn assemble_appends_live_price() {
        let report = assemble(
            "SBIN.NS",
            &week(),
            quote("SBIN.NS", 110.0, Some(2.8)),
            Vec::new(),
            &clock(),
            monday_morning(),
        );

        assert_eq!(report.history.len(), 6);
        let last = report.history.last().unwrap();
        assert_eq!(last.date, date(3, 2));
        assert_eq!(last.close, 110.0);
        assert_eq!(last.volume, 0);
        assert_eq!(report.market_status, MarketStatus::Open);
        assert_eq!(report.currency_symbol, "₹");
        assert_eq!(report.indicators.rsi, None);
        assert_eq!(report.prediction.trend, Trend::Up);
        assert!(report.prediction.next_day > 110.0);
    }

    #[test]
    fn zero_quote_anchors_on_last_close() {
        let report = assemble(
            "SBIN.NS",
            &week(),
            quote("SBIN.NS", 0.0, None),
            Vec::new(),
            &clock(),
            monday_morning(),
        );
        assert_eq!(report.history, week());
        assert!(report.prediction.next_day > 107.0);
    }

    #[test]
    fn empty_history_and_zero_quote() {
        let report = assemble(
            "NEW.NS",
            &History::default(),
            quote("NEW.NS", 0.0, None),
            Vec::new(),
            &clock(),
            monday_morning(),
        );
        assert!(report.history.is_empty());
        assert_eq!(report.prediction, PredictionResult::neutral(0.0));
        assert_eq!(report.indicators, Indicators::default());
    }

    #[tokio::test]
    async fn builder_fetches_all_inputs() {
        let builder = ReportBuilder::new(
            Arc::new(StaticHistory(week())),
            Arc::new(StaticQuotes),
            Arc::new(Headlines),
            ExchangeClocks::new(clock()),
        );
        let report = builder.build("SBIN.NS", monday_morning()).await.unwrap();
        assert_eq!(report.symbol, "SBIN.NS");
        assert_eq!(report.news.len(), 1);
        assert_eq!(report.news[0].title, "SBIN.NS in focus");
        assert_eq!(report.history.len(), 6);
    }

    #[tokio::test]
    async fn any_provider_failure_fails_the_report() {
        let builder = ReportBuilder::new(
            Arc::new(StaticHistory(week())),
            Arc::new(StaticQuotes),
            Arc::new(BrokenNews),
            ExchangeClocks::new(clock()),
        );
        let err = builder.build("SBIN.NS", monday_morning()).await.unwrap_err();
        assert!(err.to_string().contains("news"));

        let builder = ReportBuilder::new(
            Arc::new(StaticHistory(week())),
            Arc::new(StaticQuotes),
            Arc::new(Headlines),
            ExchangeClocks::new(clock()),
        );
        assert!(builder.build("MISSING.NS", monday_morning()).await.is_err());
    }

    #[tokio::test]
    async fn builder_uses_clock_of_listing_exchange() {
        // Monday 2026-03-02 is a holiday on BSE only.
        let bse = MarketClock::new(
            "BSE",
            SessionWindow::nse(),
            Arc::new(StaticHolidayCalendar::new().with_holidays("BSE", [date(3, 2)])),
        );
        let builder = ReportBuilder::new(
            Arc::new(StaticHistory(week())),
            Arc::new(StaticQuotes),
            Arc::new(Headlines),
            ExchangeClocks::new(clock()).with_suffix(".BO", bse),
        );

        let nse = builder.build("SBIN.NS", monday_morning()).await.unwrap();
        assert_eq!(nse.market_status, MarketStatus::Open);

        let bse = builder.build("SBIN.BO", monday_morning()).await.unwrap();
        assert_eq!(bse.market_status, MarketStatus::Closed);
    }

    #[test]
    fn report_serialises_history_as_array() {
        let report = assemble(
            "SBIN.NS",
            &week(),
            quote("SBIN.NS", 110.0, None),
            Vec::new(),
            &clock(),
            monday_morning(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["history"].as_array().unwrap().len(), 6);
        assert_eq!(json["market_status"], "open");
        assert!(json["indicators"]["macd"].is_null());
    }

    #[tokio::test]
    async fn overview_keeps_order_and_rounds() {
        let symbols: Vec<String> = ["SBIN.NS", "TCS.NS", "FLAT.NS"]
            .into_iter()
            .map(String::from)
            .collect();
        // Saturday 2026-03-07.
        let saturday = Utc.with_ymd_and_hms(2026, 3, 7, 5, 0, 0).unwrap();
        let overview = market_overview(&StaticQuotes, &clock(), &symbols, saturday)
            .await
            .unwrap();

        assert_eq!(overview.market_status, MarketStatus::Closed);
        let labels: Vec<&str> = overview.quotes.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(labels, ["SBIN", "TCS", "FLAT"]);
        assert_eq!(overview.quotes[0].change_percent, 2.8);
        assert_eq!(overview.quotes[0].trend, Trend::Up);
        assert_eq!(overview.quotes[1].change_percent, -1.0);
        assert_eq!(overview.quotes[1].trend, Trend::Down);
        assert_eq!(overview.quotes[2].change_percent, 0.0);
        assert_eq!(overview.quotes[2].trend, Trend::Up);
    }

    #[tokio::test]
    async fn overview_fails_on_any_quote_error() {
        let symbols = vec!["SBIN.NS".to_string(), "GONE.NS".to_string()];
        assert!(market_overview(&StaticQuotes, &clock(), &symbols, monday_morning())
            .await
            .is_err());
    }
}
