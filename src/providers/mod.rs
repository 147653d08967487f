// =============================================================================
// Data Providers
// =============================================================================
//
// Upstream collaborators that resolve history, quotes and news for a symbol.
// The engine never calls these; the report layer does, and hands the
// resolved values to the pure engine functions.
//
// - Yahoo chart API: daily history + intraday quote
// - Finnhub: company news + preferred quote (needs FINNHUB_API_KEY)
// - Google News RSS: keyless headline fallback

pub mod finnhub;
pub mod google_news;
pub mod yahoo;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::market_data::History;
use crate::types::{NewsItem, Quote};

pub use finnhub::FinnhubClient;
pub use google_news::GoogleNewsRss;
pub use yahoo::YahooChartClient;

/// Daily OHLCV history, ascending and de-duplicated by date.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn history(&self, symbol: &str) -> Result<History>;
}

/// Live quote snapshot.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote>;
}

/// Recent headlines, newest first as the provider orders them.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>>;
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// Ask `primary` first; on any error log it and ask `fallback`.
pub struct FallbackQuoteProvider {
    primary: Arc<dyn QuoteProvider>,
    fallback: Arc<dyn QuoteProvider>,
}

impl FallbackQuoteProvider {
    pub fn new(primary: Arc<dyn QuoteProvider>, fallback: Arc<dyn QuoteProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl QuoteProvider for FallbackQuoteProvider {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        match self.primary.quote(symbol).await {
            Ok(quote) => Ok(quote),
            Err(e) => {
                warn!(symbol, error = %e, "primary quote provider failed, using fallback");
                self.fallback.quote(symbol).await
            }
        }
    }
}

/// Ask `primary` first; fall back when it errors or has no headlines.
pub struct FallbackNewsProvider {
    primary: Arc<dyn NewsProvider>,
    fallback: Arc<dyn NewsProvider>,
}

impl FallbackNewsProvider {
    pub fn new(primary: Arc<dyn NewsProvider>, fallback: Arc<dyn NewsProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl NewsProvider for FallbackNewsProvider {
    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        match self.primary.news(symbol).await {
            Ok(items) if !items.is_empty() => Ok(items),
            Ok(_) => {
                debug!(symbol, "primary news provider returned nothing, using fallback");
                self.fallback.news(symbol).await
            }
            Err(e) => {
                warn!(symbol, error = %e, "primary news provider failed, using fallback");
                self.fallback.news(symbol).await
            }
        }
    }
}
