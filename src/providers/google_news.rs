// =============================================================================
// Google News RSS — keyless headline search
// =============================================================================
//
// GET /rss/search?q={TICKER}+stock&hl=en-US&gl=US&ceid=US:en
//
// Items carry `title`, `link`, an RFC 2822 `pubDate` and a `<source url=..>`
// element naming the publisher. Items with an unparseable date are skipped.
// =============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::providers::NewsProvider;
use crate::symbol::display_label;
use crate::types::NewsItem;

const DEFAULT_SOURCE: &str = "Google News";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(default)]
    source: Option<RssSource>,
}

#[derive(Debug, Deserialize)]
struct RssSource {
    #[serde(default, rename = "$text")]
    name: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Map an RSS document to at most `limit` news items, in feed order.
pub fn parse_feed(body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let rss: Rss = quick_xml::de::from_str(body).context("failed to parse RSS feed")?;

    let items = rss
        .channel
        .items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .filter_map(|item| {
            let published_at = item
                .pub_date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())?
                .with_timezone(&Utc);
            Some(NewsItem {
                title: item.title.trim().to_string(),
                link: item.link.trim().to_string(),
                published_at,
                source: item
                    .source
                    .map(|s| s.name.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            })
        })
        .take(limit)
        .collect();

    Ok(items)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Headline search over the public Google News RSS endpoint.
#[derive(Clone)]
pub struct GoogleNewsRss {
    base_url: String,
    limit: usize,
    client: reqwest::Client,
}

impl GoogleNewsRss {
    pub fn new(base_url: impl Into<String>, limit: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, limit, "GoogleNewsRss initialised");

        Ok(Self {
            base_url,
            limit,
            client,
        })
    }
}

#[async_trait]
impl NewsProvider for GoogleNewsRss {
    #[instrument(skip(self), name = "google_news::news")]
    async fn news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let url = format!("{}/rss/search", self.base_url);
        let query = format!("{} stock", display_label(symbol));

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("hl", "en-US"),
                ("gl", "US"),
                ("ceid", "US:en"),
            ])
            .send()
            .await
            .with_context(|| format!("GET news feed for {symbol} failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read news feed for {symbol}"))?;

        if !status.is_success() {
            bail!("Google News feed for {} returned {}", symbol, status);
        }

        let items = parse_feed(&body, self.limit)
            .with_context(|| format!("invalid news feed for {symbol}"))?;
        debug!(symbol, count = items.len(), "news feed fetched");
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
