//! Equity Quotes
//!
//! Symbol normalization for inbound requests and the deterministic quote
//! synthesized when the upstream cannot answer.

use serde::{Deserialize, Serialize};

/// Suffix some clients append for NSE listings (Yahoo style).
const NSE_SUFFIX: &str = ".NS";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Quote record in the upstream's field naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Ticker symbol.
    pub symbol: String,
    /// Company display name.
    pub company_name: String,
    /// Last traded price.
    pub last_price: f64,
    /// Absolute change from previous close.
    pub change: f64,
    /// Percent change from previous close.
    #[serde(rename = "pChange")]
    pub percent_change: f64,
    /// Traded volume for the session.
    pub total_traded_volume: u64,
}

impl QuoteRecord {
    /// Build the stand-in quote for `symbol`.
    ///
    /// Every numeric field derives from [`stable_hash`], so the same symbol
    /// yields the same record in every process.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn fallback(symbol: &str) -> Self {
        let hash = stable_hash(symbol);
        let change = (hash % 100) as i64 - 50;

        Self {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Limited"),
            last_price: 1000.0 + (hash % 1000) as f64,
            change: change as f64,
            percent_change: change as f64 / 10.0,
            total_traded_volume: hash % 1_000_000 + 100_000,
        }
    }
}

/// 64-bit FNV-1a over the UTF-8 bytes of `input`.
#[must_use]
pub fn stable_hash(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Normalize a symbol as typed by a client.
///
/// Trims, upper-cases and strips a trailing `.NS`. Returns `None` when
/// nothing is left.
#[must_use]
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let symbol = upper.strip_suffix(NSE_SUFFIX).unwrap_or(&upper).trim();

    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(stable_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(stable_hash("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(stable_hash("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn fallback_values_are_pinned() {
        let quote = QuoteRecord::fallback("RELIANCE");
        assert_eq!(quote.last_price, 1920.0);
        assert_eq!(quote.change, -30.0);
        assert_eq!(quote.percent_change, -3.0);
        assert_eq!(quote.total_traded_volume, 159_920);
    }

    #[test_case("reliance", Some("RELIANCE") ; "lowercase")]
    #[test_case("TCS.NS", Some("TCS") ; "yahoo suffix")]
    #[test_case("infy.ns", Some("INFY") ; "lowercase suffix")]
    #[test_case("  sbin  ", Some("SBIN") ; "surrounding whitespace")]
    #[test_case("M&M", Some("M&M") ; "ampersand kept")]
    #[test_case("", None ; "empty")]
    #[test_case(".NS", None ; "suffix only")]
    #[test_case("   ", None ; "blank")]
    fn symbol_normalization(raw: &str, expected: Option<&str>) {
        assert_eq!(normalize_symbol(raw).as_deref(), expected);
    }

    #[test]
    fn fallback_serializes_with_upstream_field_names() {
        let json = serde_json::to_value(QuoteRecord::fallback("TCS")).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "symbol",
            "companyName",
            "lastPrice",
            "change",
            "pChange",
            "totalTradedVolume",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(json["companyName"], "TCS Limited");
    }

    proptest! {
        #[test]
        fn fallback_is_deterministic_and_in_range(symbol in "[A-Z&-]{1,20}") {
            let first = QuoteRecord::fallback(&symbol);
            let second = QuoteRecord::fallback(&symbol);
            prop_assert_eq!(&first, &second);

            prop_assert_eq!(first.symbol, symbol);
            prop_assert!(first.last_price >= 1000.0 && first.last_price < 2000.0);
            prop_assert!(first.change >= -50.0 && first.change < 50.0);
            prop_assert!((first.percent_change * 10.0 - first.change).abs() < 1e-9);
            prop_assert!(first.total_traded_volume >= 100_000);
            prop_assert!(first.total_traded_volume < 1_100_000);
        }
    }
}
