// =============================================================================
// Yahoo Finance Chart API Client
// =============================================================================
//
// GET /v8/finance/chart/{symbol}?range=..&interval=..
//
// One endpoint serves both daily history (`interval=1d`) and the live quote
// (`range=1d&interval=1m`, price = last intraday close). Rows with a null or
// zero close are dropped; missing open/high/low fall back to the close.
// =============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::market_data::{History, HistoryPoint};
use crate::providers::{HistoryProvider, QuoteProvider};
use crate::symbol::exchange_for_symbol;
use crate::types::Quote;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; stockcast/1.0)";

/// Currency assumed when the chart metadata omits one.
const DEFAULT_CURRENCY: &str = "INR";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    symbol: Option<String>,
    exchange_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    #[serde(default)]
    adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Positive, finite value at `i`, if any.
fn column_value(column: &[Option<f64>], i: usize) -> Option<f64> {
    column
        .get(i)
        .copied()
        .flatten()
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn first_result(body: &str) -> Result<ChartResult> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("failed to parse chart JSON")?;

    if let Some(err) = envelope.chart.error {
        bail!("chart API error {}: {}", err.code, err.description);
    }

    envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .context("chart response has no result")
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Turn a daily chart payload into a validated [`History`].
pub fn parse_history(body: &str) -> Result<History> {
    let result = first_result(body)?;
    let empty = QuoteColumns::default();
    let columns = result.indicators.quote.first().unwrap_or(&empty);
    let adjclose: &[Option<f64>] = result
        .indicators
        .adjclose
        .first()
        .map(|c| c.adjclose.as_slice())
        .unwrap_or_default();

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = column_value(&columns.close, i).or_else(|| column_value(adjclose, i))
        else {
            continue;
        };
        let Some(when) = DateTime::from_timestamp(ts, 0) else {
            debug!(ts, "skipping row with out-of-range timestamp");
            continue;
        };

        let point = HistoryPoint::new(
            when.date_naive(),
            column_value(&columns.open, i).unwrap_or(close),
            column_value(&columns.high, i).unwrap_or(close),
            column_value(&columns.low, i).unwrap_or(close),
            close,
            column_value(&columns.volume, i).map_or(0, |v| v.round() as u64),
        );
        match point {
            Ok(point) => points.push(point),
            Err(e) => debug!(ts, error = %e, "skipping invalid chart row"),
        }
    }

    Ok(History::from_unsorted(points)?)
}

/// Turn an intraday chart payload into a [`Quote`] for `requested`.
///
/// A payload without any usable price yields `price == 0.0`, which the
/// merger treats as "no live update".
pub fn parse_quote(body: &str, requested: &str) -> Result<Quote> {
    let result = first_result(body)?;
    let meta = result.meta;

    let last_close = result
        .indicators
        .quote
        .first()
        .and_then(|c| c.close.iter().rev().find_map(|v| (*v).filter(|p| p.is_finite() && *p > 0.0)));
    let price = last_close
        .or(meta.regular_market_price.filter(|p| p.is_finite() && *p > 0.0))
        .unwrap_or(0.0);

    let change_percent = meta
        .chart_previous_close
        .filter(|prev| prev.is_finite() && *prev > 0.0 && price > 0.0)
        .map(|prev| (price - prev) / prev * 100.0);

    let symbol = meta.symbol.unwrap_or_else(|| requested.to_string());
    let exchange_name = meta
        .exchange_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| exchange_for_symbol(&symbol).to_string());

    Ok(Quote {
        symbol,
        price,
        change_percent,
        currency: meta.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        exchange_name,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo chart API client serving history and quotes.
#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    history_range: String,
    client: reqwest::Client,
}

impl YahooChartClient {
    /// Create a client for `base_url` (e.g. `https://query1.finance.yahoo.com`)
    /// fetching `history_range` of daily bars (e.g. `1y`).
    pub fn new(
        base_url: impl Into<String>,
        history_range: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, "YahooChartClient initialised");

        Ok(Self {
            base_url,
            history_range: history_range.into(),
            client,
        })
    }

    async fn fetch_chart(&self, symbol: &str, range: &str, interval: &str) -> Result<String> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("range", range),
                ("interval", interval),
                ("includePrePost", "false"),
            ])
            .send()
            .await
            .with_context(|| format!("GET chart for {symbol} failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read chart body for {symbol}"))?;

        if !status.is_success() {
            bail!("Yahoo chart for {} returned {}: {}", symbol, status, body);
        }

        Ok(body)
    }
}

#[async_trait]
impl HistoryProvider for YahooChartClient {
    #[instrument(skip(self), name = "yahoo::history")]
    async fn history(&self, symbol: &str) -> Result<History> {
        let body = self.fetch_chart(symbol, &self.history_range, "1d").await?;
        let history = parse_history(&body)
            .with_context(|| format!("invalid history payload for {symbol}"))?;
        debug!(symbol, points = history.len(), "history fetched");
        Ok(history)
    }
}

#[async_trait]
impl QuoteProvider for YahooChartClient {
    #[instrument(skip(self), name = "yahoo::quote")]
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let body = self.fetch_chart(symbol, "1d", "1m").await?;
        let quote =
            parse_quote(&body, symbol).with_context(|| format!("invalid quote payload for {symbol}"))?;
        debug!(symbol, price = quote.price, "quote fetched");
        Ok(quote)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
