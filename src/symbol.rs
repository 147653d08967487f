// =============================================================================
// Symbol helpers — exchange suffixes, exchange names, currency glyphs
// =============================================================================

use anyhow::{bail, Result};
use tracing::debug;

use crate::providers::HistoryProvider;

/// Normalise a user-supplied ticker for the quote provider.
///
/// Trims and upper-cases; a ticker that already carries an exchange suffix
/// (`RELIANCE.BO`) is kept, a bare one gets `default_suffix` (`SBIN` ->
/// `SBIN.NS`) without checking that the listing exists. Use
/// [`resolve_listing`] to find the exchange a bare ticker trades on.
pub fn resolve_symbol(raw: &str, default_suffix: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        bail!("symbol must not be empty");
    }
    if symbol.contains('.') || default_suffix.is_empty() {
        return Ok(symbol);
    }
    let suffix = default_suffix.trim_start_matches('.').to_uppercase();
    Ok(format!("{symbol}.{suffix}"))
}

/// Resolve a bare ticker to the first listing in `suffixes` that has daily
/// history, e.g. `.NS` then `.BO`.
///
/// Suffixed tickers are returned without a lookup. When no listing answers,
/// the first suffix is used and the report fetch surfaces the error.
pub async fn resolve_listing(
    raw: &str,
    suffixes: &[String],
    history: &dyn HistoryProvider,
) -> Result<String> {
    let Some(first) = suffixes.first() else {
        return resolve_symbol(raw, "");
    };
    let bare = resolve_symbol(raw, "")?;
    if bare.contains('.') {
        return Ok(bare);
    }

    for suffix in suffixes {
        let candidate = resolve_symbol(&bare, suffix)?;
        match history.history(&candidate).await {
            Ok(found) if !found.is_empty() => {
                debug!(%candidate, "listing resolved");
                return Ok(candidate);
            }
            Ok(_) => debug!(%candidate, "listing has no history"),
            Err(e) => debug!(%candidate, error = %e, "listing lookup failed"),
        }
    }

    resolve_symbol(&bare, first)
}

/// Exchange name implied by the ticker suffix.
pub fn exchange_for_symbol(symbol: &str) -> &'static str {
    let upper = symbol.to_uppercase();
    if upper.ends_with(".NS") {
        "NSE"
    } else if upper.ends_with(".BO") {
        "BSE"
    } else {
        "Market"
    }
}

/// Ticker without its exchange suffix (`SBIN.NS` -> `SBIN`).
pub fn display_label(symbol: &str) -> &str {
    symbol.split_once('.').map_or(symbol, |(label, _)| label)
}

/// Display glyph for an ISO currency code; unknown codes are returned as-is.
pub fn currency_symbol(currency: &str) -> String {
    match currency.to_uppercase().as_str() {
        "INR" => "₹".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => other.to_string(),
    }
}
