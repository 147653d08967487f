// =============================================================================
// Finnhub REST Client — company news and quotes
// =============================================================================
//
// SECURITY: the API token is read from the environment by the caller and is
// sent in the `X-Finnhub-Token` header, never in the URL. Transport errors
// are stripped of their URL before they reach the error chain.
// =============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::providers::{NewsProvider, QuoteProvider};
use crate::symbol::exchange_for_symbol;
use crate::types::{NewsItem, Quote};

const DEFAULT_SOURCE: &str = "Finnhub";
const TOKEN_HEADER: &str = "X-Finnhub-Token";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompanyNews {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price.
    #[serde(default)]
    c: Option<f64>,
    /// Change percent.
    #[serde(default)]
    dp: Option<f64>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Map a `company-news` payload to at most `limit` items. Items without a
/// headline or with an invalid timestamp are skipped.
pub fn parse_news(body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let raw: Vec<CompanyNews> =
        serde_json::from_str(body).context("failed to parse company-news JSON")?;

    let items = raw
        .into_iter()
        .filter(|n| !n.headline.trim().is_empty())
        .filter_map(|n| {
            let published_at = DateTime::<Utc>::from_timestamp(n.datetime, 0)?;
            Some(NewsItem {
                title: n.headline,
                link: n.url,
                published_at,
                source: n
                    .source
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            })
        })
        .take(limit)
        .collect();

    Ok(items)
}

/// Map a `/quote` payload. A zero or missing price means Finnhub has no data
/// for the symbol, which is an error so a fallback provider can step in.
pub fn parse_quote(body: &str, symbol: &str) -> Result<Quote> {
    let raw: FinnhubQuote = serde_json::from_str(body).context("failed to parse quote JSON")?;

    let price = raw
        .c
        .filter(|p| p.is_finite() && *p > 0.0)
        .with_context(|| format!("Finnhub has no price for {symbol}"))?;

    let exchange_name = exchange_for_symbol(symbol);
    let currency = if exchange_name == "Market" { "USD" } else { "INR" };

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        change_percent: raw.dp.filter(|dp| dp.is_finite()),
        currency: currency.to_string(),
        exchange_name: exchange_name.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Finnhub client for company news and live quotes.
#[derive(Clone)]
pub struct FinnhubClient {
    base_url: String,
    api_key: String,
    news_limit: usize,
    news_lookback_days: i64,
    client: reqwest::Client,
}

impl FinnhubClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        news_limit: usize,
        news_lookback_days: i64,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, news_limit, "FinnhubClient initialised");

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            news_limit,
            news_lookback_days,
            client,
        })
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .header(TOKEN_HEADER, self.api_key.as_str())
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("GET {path} request failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to read {path} response"))?;

        if !status.is_success() {
            bail!("Finnhub GET {} returned {}: {}", path, status, body);
        }

        Ok(body)
    }
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    #[instrument(skip(self), name = "finnhub::news")]
    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(self.news_lookback_days);
        let (from, to) = (from.to_string(), to.to_string());

        let body = self
            .get(
                "/api/v1/company-news",
                &[("symbol", symbol), ("from", &from), ("to", &to)],
            )
            .await?;
        let items = parse_news(&body, self.news_limit)
            .with_context(|| format!("invalid news payload for {symbol}"))?;

        debug!(symbol, count = items.len(), "news fetched");
        Ok(items)
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    #[instrument(skip(self), name = "finnhub::quote")]
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let body = self.get("/api/v1/quote", &[("symbol", symbol)]).await?;
        let quote = parse_quote(&body, symbol)?;
        debug!(symbol, price = quote.price, "quote fetched");
        Ok(quote)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_company_news() {
        let body = r#"[
            { "headline": "SBI posts record quarterly profit", "url": "https://example.com/a",
              "datetime": 1772423100, "source": "Reuters" },
            { "headline": "", "url": "https://example.com/empty", "datetime": 1772423100 },
            { "headline": "Banks rally", "url": "https://example.com/b", "datetime": 1772336700, "source": "" },
            { "headline": "Third", "url": "https://example.com/c", "datetime": 1772250300 }
        ]"#;
        let items = parse_news(body, 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "SBI posts record quarterly profit");
        assert_eq!(items[0].source, "Reuters");
        assert_eq!(
            items[0].published_at,
            Utc.with_ymd_and_hms(2026, 3, 2, 3, 45, 0).unwrap()
        );
        assert_eq!(items[1].title, "Banks rally");
        assert_eq!(items[1].source, "Finnhub");
    }

    #[test]
    fn empty_news_list() {
        assert!(parse_news("[]", 10).unwrap().is_empty());
        assert!(parse_news(r#"{"error":"bad token"}"#, 10).is_err());
    }

    #[test]
    fn parses_quote() {
        let quote = parse_quote(r#"{ "c": 812.4, "dp": -0.53, "pc": 816.7 }"#, "SBIN.NS").unwrap();
        assert_eq!(quote.price, 812.4);
        assert_eq!(quote.change_percent, Some(-0.53));
        assert_eq!(quote.currency, "INR");
        assert_eq!(quote.exchange_name, "NSE");

        let us = parse_quote(r#"{ "c": 190.1, "dp": 1.2 }"#, "AAPL").unwrap();
        assert_eq!(us.currency, "USD");
    }

    #[tokio::test]
    async fn transport_error_does_not_expose_token() {
        let client = FinnhubClient::new(
            "http://127.0.0.1:1",
            "SECRET_TOKEN_123",
            10,
            30,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.news("SBIN.NS").await.unwrap_err();
        assert!(!format!("{err:#}").contains("SECRET_TOKEN_123"));
        assert!(!format!("{err:?}").contains("SECRET_TOKEN_123"));

        let err = client.quote("SBIN.NS").await.unwrap_err();
        assert!(!format!("{err:#}").contains("SECRET_TOKEN_123"));
        assert!(!format!("{err:?}").contains("SECRET_TOKEN_123"));
    }

    #[test]
    fn zero_price_quote_is_an_error() {
        assert!(parse_quote(r#"{ "c": 0, "dp": null }"#, "XYZ.NS").is_err());
        assert!(parse_quote("{}", "XYZ.NS").is_err());
    }
}
