//! Market Status
//!
//! Open/closed status of the NSE capital market and the trading-hours rule
//! used when the upstream status endpoint is unavailable.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// IST is a fixed UTC+05:30 offset (no daylight saving).
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Market name reported by the synthesized status.
pub const CAPITAL_MARKET: &str = "Capital Market";

/// Index reported by the synthesized status.
pub const NIFTY_50: &str = "NIFTY 50";

/// Whether the market is trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Within trading hours on a weekday.
    Open,
    /// Outside trading hours or on a weekend.
    Closed,
}

/// One entry of the `marketState` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatusRecord {
    /// Market segment name.
    pub market: String,
    /// Current status.
    pub market_status: MarketStatus,
    /// Trading date (`YYYY-MM-DD`, exchange local time).
    pub trade_date: String,
    /// Reference index.
    pub index: String,
}

/// Trading session window in exchange-local time.
#[derive(Debug, Clone, Copy)]
pub struct TradingHours {
    offset: FixedOffset,
    open: NaiveTime,
    close: NaiveTime,
}

impl Default for TradingHours {
    fn default() -> Self {
        Self::nse()
    }
}

impl TradingHours {
    /// NSE equity session: Monday to Friday, 09:15 to 16:00 IST.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn nse() -> Self {
        Self {
            offset: FixedOffset::east_opt(IST_OFFSET_SECS).expect("static IST offset is in range"),
            open: NaiveTime::from_hms_opt(9, 15, 0).expect("static open time is valid"),
            close: NaiveTime::from_hms_opt(16, 0, 0).expect("static close time is valid"),
        }
    }

    /// Status at `now`. The open bound is inclusive, the close bound exclusive.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> MarketStatus {
        let local = now.with_timezone(&self.offset);
        let weekday = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        let time = local.time();

        if weekday && time >= self.open && time < self.close {
            MarketStatus::Open
        } else {
            MarketStatus::Closed
        }
    }

    /// Synthesized capital-market record for `now`.
    #[must_use]
    pub fn fallback_record(&self, now: DateTime<Utc>) -> MarketStatusRecord {
        MarketStatusRecord {
            market: CAPITAL_MARKET.to_string(),
            market_status: self.status_at(now),
            trade_date: now
                .with_timezone(&self.offset)
                .format("%Y-%m-%d")
                .to_string(),
            index: NIFTY_50.to_string(),
        }
    }
}
