//! Upstream Port (Driven Port)
//!
//! Interface for fetching JSON from the market-data website.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Upstream API endpoints the relay knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Equity quote for a normalized symbol.
    Quote {
        /// Normalized ticker symbol.
        symbol: String,
    },
    /// Index listing of F&O eligible securities.
    FnoSecurities,
    /// Exchange market status.
    MarketStatus,
    /// NIFTY 50 index constituents.
    Nifty50,
}

impl Endpoint {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Quote { .. } => "quote",
            Self::FnoSecurities => "fno_securities",
            Self::MarketStatus => "market_status",
            Self::Nifty50 => "nifty_50",
        }
    }
}

/// Upstream errors.
///
/// Only `AuthRejected` invalidates the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream refused the session (HTTP 403 or 451).
    #[error("upstream rejected session: HTTP {status}")]
    AuthRejected {
        /// HTTP status returned.
        status: u16,
    },

    /// Upstream answered with any other non-200 status.
    #[error("upstream returned HTTP {status}")]
    Status {
        /// HTTP status returned.
        status: u16,
    },

    /// Request did not complete before its deadline.
    #[error("upstream request timed out")]
    Timeout,

    /// Connection or transport failure.
    #[error("upstream network error: {0}")]
    Network(String),

    /// Body was not valid JSON.
    #[error("upstream returned invalid JSON: {0}")]
    InvalidJson(String),
}

impl UpstreamError {
    /// Whether the session cookie was rejected.
    #[must_use]
    pub const fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::AuthRejected { .. })
    }

    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthRejected { .. } => "auth_rejected",
            Self::Status { .. } => "status",
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::InvalidJson(_) => "invalid_json",
        }
    }
}

/// Read-only view of the upstream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Time of the last successful cookie refresh.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Whether a non-empty cookie is held and younger than the TTL.
    pub valid: bool,
}

/// Access to the upstream website.
#[async_trait]
pub trait UpstreamPort: Send + Sync {
    /// Fetch `endpoint` with a live session and parse the body as JSON.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, UpstreamError>;

    /// Current session state.
    fn session(&self) -> SessionSnapshot;
}
