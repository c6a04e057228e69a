//! Domain Layer - Market data records and fallback rules.
//!
//! Pure types with no I/O. Everything here is deterministic given its
//! inputs, which is what makes the fallback payloads reproducible.

/// Symbol listings (F&O symbols, NIFTY 50 top stocks).
pub mod listing;

/// Market open/closed status and the trading-hours rule.
pub mod market_status;

/// Equity quotes, symbol normalization and the synthesized quote.
pub mod quote;
