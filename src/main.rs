// =============================================================================
// Stockcast — Main Entry Point
// =============================================================================
//
// Usage:
//   stockcast [SYMBOL]     report for SYMBOL (default SBIN), printed as JSON;
//                          a bare ticker is tried on each configured exchange
//   stockcast --overview   quotes for the configured watch-list
//   stockcast --status [SYMBOL]
//                          session state of the exchange listing SYMBOL
//                          (primary exchange without one)
//
// Logs go to stderr so stdout stays valid JSON.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockcast::market_clock::SessionBounds;
use stockcast::providers::{
    FallbackNewsProvider, FallbackQuoteProvider, FinnhubClient, GoogleNewsRss, NewsProvider,
    QuoteProvider, YahooChartClient,
};
use stockcast::report::{market_overview, ReportBuilder};
use stockcast::symbol::{resolve_listing, resolve_symbol};
use stockcast::{EngineConfig, MarketStatus};

const DEFAULT_CONFIG_PATH: &str = "stockcast_config.json";
const DEFAULT_SYMBOL: &str = "SBIN";

enum Command {
    Report(String),
    Overview,
    Status(Option<String>),
}

impl Command {
    fn from_args(mut args: impl Iterator<Item = String>) -> Self {
        match args.next().as_deref() {
            Some("--overview") => Self::Overview,
            Some("--status") => Self::Status(args.next()),
            Some(symbol) => Self::Report(symbol.to_string()),
            None => Self::Report(DEFAULT_SYMBOL.to_string()),
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    exchange: &'a str,
    market_status: MarketStatus,
    session: Option<SessionBounds>,
    next_open: Option<chrono::DateTime<chrono::FixedOffset>>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("STOCKCAST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, path = %config_path, "Failed to load config, using defaults");
        EngineConfig::default()
    });

    // Override the overview watch-list from env if available.
    if let Ok(syms) = std::env::var("STOCKCAST_SYMBOLS") {
        let symbols: Vec<String> = syms
            .split(',')
            .filter_map(|s| resolve_symbol(s, &config.default_suffix).ok())
            .collect();
        if !symbols.is_empty() {
            config.overview_symbols = symbols;
        }
    }

    let now = Utc::now();
    let command = Command::from_args(std::env::args().skip(1));

    if let Command::Status(symbol) = &command {
        let clock = match symbol {
            Some(raw) => config.clock_for_symbol(&resolve_symbol(raw, &config.default_suffix)?)?,
            None => config.primary_clock()?,
        };
        return print_json(&StatusOutput {
            exchange: clock.exchange(),
            market_status: clock.status(now),
            session: clock.session_bounds(now),
            next_open: clock.next_open(now),
        });
    }

    // ── 2. Providers ─────────────────────────────────────────────────────
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let yahoo = Arc::new(YahooChartClient::new(
        config.yahoo_base_url.clone(),
        config.history_range.clone(),
        timeout,
    )?);
    let rss = Arc::new(GoogleNewsRss::new(
        config.google_news_base_url.clone(),
        config.news_limit,
        timeout,
    )?);

    let (quotes, news): (Arc<dyn QuoteProvider>, Arc<dyn NewsProvider>) =
        match std::env::var("FINNHUB_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                let finnhub = Arc::new(FinnhubClient::new(
                    config.finnhub_base_url.clone(),
                    key.trim(),
                    config.news_limit,
                    config.news_lookback_days,
                    timeout,
                )?);
                info!("Finnhub enabled for quotes and news");
                let quotes: Arc<dyn QuoteProvider> =
                    Arc::new(FallbackQuoteProvider::new(finnhub.clone(), yahoo.clone()));
                let news: Arc<dyn NewsProvider> =
                    Arc::new(FallbackNewsProvider::new(finnhub, rss));
                (quotes, news)
            }
            _ => {
                warn!("FINNHUB_API_KEY not set, quotes from Yahoo and news from RSS");
                let quotes: Arc<dyn QuoteProvider> = yahoo.clone();
                let news: Arc<dyn NewsProvider> = rss;
                (quotes, news)
            }
        };

    // ── 3. Run ───────────────────────────────────────────────────────────
    match command {
        Command::Overview => {
            let clock = config.primary_clock()?;
            let overview =
                market_overview(quotes.as_ref(), &clock, &config.overview_symbols, now).await?;
            print_json(&overview)
        }
        Command::Report(raw) => {
            let symbol = resolve_listing(&raw, &config.listing_suffixes(), yahoo.as_ref()).await?;
            let builder = ReportBuilder::new(yahoo, quotes, news, config.exchange_clocks()?);
            let report = builder.build(&symbol, now).await?;
            print_json(&report)
        }
        Command::Status(_) => Ok(()),
    }
}
