//! Index Listings
//!
//! Reshaping of the upstream `equity-stockIndices` payload into the symbol
//! list and the top-stocks list, plus the literal symbol fallback.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Maximum symbols returned by the symbol listing.
pub const MAX_SYMBOLS: usize = 500;

/// Number of constituents returned by the top-stocks listing.
pub const TOP_STOCKS_LIMIT: usize = 20;

/// Large-cap tickers served when the F&O listing is unavailable.
pub const FALLBACK_SYMBOLS: [&str; 29] = [
    "RELIANCE",
    "TCS",
    "HDFCBANK",
    "INFY",
    "HINDUNILVR",
    "ICICIBANK",
    "KOTAKBANK",
    "BHARTIARTL",
    "ITC",
    "SBIN",
    "LT",
    "ASIANPAINT",
    "AXISBANK",
    "MARUTI",
    "BAJFINANCE",
    "HCLTECH",
    "DMART",
    "SUNPHARMA",
    "TITAN",
    "ULTRACEMCO",
    "NESTLEIND",
    "WIPRO",
    "ADANIENT",
    "JSWSTEEL",
    "POWERGRID",
    "TATAMOTORS",
    "NTPC",
    "COALINDIA",
    "ONGC",
];

/// Owned copy of [`FALLBACK_SYMBOLS`].
#[must_use]
pub fn fallback_symbols() -> Vec<String> {
    FALLBACK_SYMBOLS.iter().map(ToString::to_string).collect()
}

/// Constituent of an index listing in the shape the frontend consumes.
///
/// Numeric fields keep the upstream representation, so integral volumes stay
/// integers on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStock {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name, or the symbol when the listing omits it.
    pub name: String,
    /// Last traded price.
    pub price: Number,
    /// Absolute change.
    pub change: Number,
    /// Percent change.
    pub change_percent: Number,
    /// Traded volume.
    pub volume: Number,
    /// Value of `meta.companyName`, or `"N/A"`.
    pub market_cap: String,
}

impl TopStock {
    fn from_item(item: &Value) -> Self {
        let symbol = string_field(item, "symbol").unwrap_or_default();
        let name = string_field(item, "companyName").unwrap_or_else(|| symbol.clone());
        let market_cap = item
            .get("meta")
            .and_then(|meta| string_field(meta, "companyName"))
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            name,
            price: number_field(item, "lastPrice"),
            change: number_field(item, "change"),
            change_percent: number_field(item, "pChange"),
            volume: number_field(item, "totalTradedVolume"),
            market_cap,
            symbol,
        }
    }
}

/// Symbols of the `data` array, capped at [`MAX_SYMBOLS`].
///
/// Items without a string `symbol` are skipped. Returns `None` when the
/// payload has no `data` array.
#[must_use]
pub fn extract_symbols(payload: &Value) -> Option<Vec<String>> {
    let items = payload.get("data")?.as_array()?;

    Some(
        items
            .iter()
            .filter_map(|item| string_field(item, "symbol"))
            .take(MAX_SYMBOLS)
            .collect(),
    )
}

/// First [`TOP_STOCKS_LIMIT`] items of the `data` array as [`TopStock`]s.
///
/// Returns `None` when the payload has no `data` array.
#[must_use]
pub fn extract_top_stocks(payload: &Value) -> Option<Vec<TopStock>> {
    let items = payload.get("data")?.as_array()?;

    Some(
        items
            .iter()
            .take(TOP_STOCKS_LIMIT)
            .map(TopStock::from_item)
            .collect(),
    )
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(ToString::to_string)
}

// Upstream occasionally sends numbers as strings.
fn number_field(item: &Value, key: &str) -> Number {
    match item.get(key) {
        Some(Value::Number(n)) => n.clone(),
        Some(Value::String(s)) => parse_number(s).unwrap_or_else(zero),
        _ => zero(),
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let cleaned = raw.trim().replace(',', "");

    if let Ok(int) = cleaned.parse::<i64>() {
        return Some(Number::from(int));
    }
    cleaned.parse::<f64>().ok().and_then(Number::from_f64)
}

fn zero() -> Number {
    Number::from(0)
}
