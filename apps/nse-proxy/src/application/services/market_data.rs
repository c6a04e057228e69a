//! Market Data Service
//!
//! One method per relay route. Each composes an upstream fetch, a shallow
//! shape check and a fallback.
//!
//! # Availability Policy
//!
//! Upstream failures never reach the caller. Auth rejections, timeouts,
//! non-200 answers and unexpected shapes all resolve to fallback data
//! ([`DataSource::Fallback`]). Only faults inside the service itself surface
//! as [`ServiceError`].

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::application::ports::{Clock, Endpoint, UpstreamError, UpstreamPort};
use crate::domain::listing::{self, TopStock};
use crate::domain::market_status::{MarketStatusRecord, TradingHours};
use crate::domain::quote::QuoteRecord;

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Upstream answer, possibly reshaped.
    Upstream,
    /// Synthesized or literal stand-in.
    Fallback,
}

impl DataSource {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::Fallback => "fallback",
        }
    }
}

/// Payload tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    /// Response body.
    pub body: T,
    /// Origin of the body.
    pub source: DataSource,
}

impl<T> Served<T> {
    const fn upstream(body: T) -> Self {
        Self {
            body,
            source: DataSource::Upstream,
        }
    }

    const fn fallback(body: T) -> Self {
        Self {
            body,
            source: DataSource::Fallback,
        }
    }
}

/// Body of `/api/nse/symbols`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolsResponse {
    /// Ticker symbols.
    pub symbols: Vec<String>,
}

/// Synthesized body of `/api/nse/market-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStateResponse {
    /// Status per market segment.
    pub market_state: Vec<MarketStatusRecord>,
}

/// Body of `/api/nse/top-stocks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopStocksResponse {
    /// Index constituents.
    pub stocks: Vec<TopStock>,
}

/// Body of `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Current time, RFC 3339 UTC.
    pub timestamp: String,
    /// Last successful cookie refresh, RFC 3339 UTC.
    pub cookies_last_updated: Option<String>,
    /// Whether the session cookie is currently usable.
    pub cookies_valid: bool,
}

/// Faults inside the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A synthesized payload could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Relay route policies over an upstream and a clock.
#[derive(Clone)]
pub struct MarketDataService {
    upstream: Arc<dyn UpstreamPort>,
    clock: Arc<dyn Clock>,
    trading_hours: TradingHours,
}

impl MarketDataService {
    /// Create a service using the NSE trading hours.
    #[must_use]
    pub fn new(upstream: Arc<dyn UpstreamPort>, clock: Arc<dyn Clock>) -> Self {
        Self {
            upstream,
            clock,
            trading_hours: TradingHours::nse(),
        }
    }

    /// Quote for an already normalized `symbol`.
    ///
    /// A JSON object from upstream is passed through untouched; anything else
    /// yields [`QuoteRecord::fallback`].
    pub async fn quote(&self, symbol: &str) -> Result<Served<Value>, ServiceError> {
        let endpoint = Endpoint::Quote {
            symbol: symbol.to_string(),
        };

        match self.upstream.fetch(&endpoint).await {
            Ok(body) if body.is_object() => Ok(Served::upstream(body)),
            outcome => {
                log_fallback(&endpoint, &outcome);
                let record = QuoteRecord::fallback(symbol);
                Ok(Served::fallback(serde_json::to_value(record)?))
            }
        }
    }

    /// F&O symbol listing, or the literal large-cap list.
    pub async fn symbols(&self) -> Served<SymbolsResponse> {
        let endpoint = Endpoint::FnoSecurities;
        let outcome = self.upstream.fetch(&endpoint).await;

        if let Ok(Some(symbols)) = outcome.as_ref().map(listing::extract_symbols) {
            return Served::upstream(SymbolsResponse { symbols });
        }

        log_fallback(&endpoint, &outcome);
        Served::fallback(SymbolsResponse {
            symbols: listing::fallback_symbols(),
        })
    }

    /// Upstream market status, or the trading-hours rule at the current time.
    pub async fn market_status(&self) -> Result<Served<Value>, ServiceError> {
        let endpoint = Endpoint::MarketStatus;

        match self.upstream.fetch(&endpoint).await {
            Ok(body) if body.is_object() => Ok(Served::upstream(body)),
            outcome => {
                log_fallback(&endpoint, &outcome);
                let response = MarketStateResponse {
                    market_state: vec![self.trading_hours.fallback_record(self.clock.now())],
                };
                Ok(Served::fallback(serde_json::to_value(response)?))
            }
        }
    }

    /// First NIFTY 50 constituents, or an empty list.
    pub async fn top_stocks(&self) -> Served<TopStocksResponse> {
        let endpoint = Endpoint::Nifty50;
        let outcome = self.upstream.fetch(&endpoint).await;

        if let Ok(Some(stocks)) = outcome.as_ref().map(listing::extract_top_stocks) {
            return Served::upstream(TopStocksResponse { stocks });
        }

        log_fallback(&endpoint, &outcome);
        Served::fallback(TopStocksResponse { stocks: Vec::new() })
    }

    /// Process and session health. Never touches the upstream.
    #[must_use]
    pub fn health(&self) -> HealthResponse {
        let session = self.upstream.session();

        HealthResponse {
            status: "ok",
            timestamp: format_timestamp(self.clock.now()),
            cookies_last_updated: session.last_refresh.map(format_timestamp),
            cookies_valid: session.valid,
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn log_fallback(endpoint: &Endpoint, outcome: &Result<Value, UpstreamError>) {
    match outcome {
        Err(e) => tracing::warn!(
            endpoint = endpoint.name(),
            error = %e,
            "Upstream request failed, serving fallback"
        ),
        Ok(_) => tracing::warn!(
            endpoint = endpoint.name(),
            "Unexpected upstream response shape, serving fallback"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SessionSnapshot;
    use crate::infrastructure::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Upstream answering every endpoint with the same canned outcome.
    struct CannedUpstream {
        outcome: Result<Value, UpstreamError>,
        session: SessionSnapshot,
        calls: Mutex<Vec<Endpoint>>,
    }

    impl CannedUpstream {
        fn new(outcome: Result<Value, UpstreamError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                session: SessionSnapshot::default(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl UpstreamPort for CannedUpstream {
        async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, UpstreamError> {
            self.calls.lock().push(endpoint.clone());
            self.outcome.clone()
        }

        fn session(&self) -> SessionSnapshot {
            self.session
        }
    }

    fn wednesday_morning() -> DateTime<Utc> {
        // 10:00 IST
        Utc.with_ymd_and_hms(2024, 1, 10, 4, 30, 0).unwrap()
    }

    fn service(upstream: Arc<CannedUpstream>) -> MarketDataService {
        MarketDataService::new(upstream, Arc::new(ManualClock::new(wednesday_morning())))
    }

    #[tokio::test]
    async fn quote_passes_upstream_object_through() {
        let body = json!({"info": {"symbol": "TCS"}, "priceInfo": {"lastPrice": 3900.5}});
        let upstream = CannedUpstream::new(Ok(body.clone()));
        let served = service(Arc::clone(&upstream)).quote("TCS").await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(served.body, body);
        assert_eq!(
            upstream.calls.lock().as_slice(),
            &[Endpoint::Quote {
                symbol: "TCS".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn quote_falls_back_on_auth_rejection() {
        let upstream = CannedUpstream::new(Err(UpstreamError::AuthRejected { status: 403 }));
        let served = service(upstream).quote("RELIANCE").await.unwrap();

        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(
            served.body,
            serde_json::to_value(QuoteRecord::fallback("RELIANCE")).unwrap()
        );
    }

    #[tokio::test]
    async fn quote_falls_back_on_non_object() {
        let upstream = CannedUpstream::new(Ok(json!("blocked")));
        let served = service(upstream).quote("SBIN").await.unwrap();
        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.body["symbol"], "SBIN");
    }

    #[tokio::test]
    async fn symbols_extracted_from_listing() {
        let upstream = CannedUpstream::new(Ok(json!({
            "data": [{"symbol": "NIFTY"}, {"symbol": "ABB"}]
        })));
        let served = service(upstream).symbols().await;

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(served.body.symbols, vec!["NIFTY", "ABB"]);
    }

    #[tokio::test]
    async fn symbols_fall_back_on_bad_shape() {
        let upstream = CannedUpstream::new(Ok(json!({"data": "nope"})));
        let served = service(upstream).symbols().await;

        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.body.symbols, listing::fallback_symbols());
    }

    #[tokio::test]
    async fn market_status_fallback_uses_clock() {
        let upstream = CannedUpstream::new(Err(UpstreamError::Timeout));
        let served = service(upstream).market_status().await.unwrap();

        assert_eq!(served.source, DataSource::Fallback);
        assert_eq!(served.body["marketState"][0]["marketStatus"], "Open");
        assert_eq!(served.body["marketState"][0]["tradeDate"], "2024-01-10");
    }

    #[tokio::test]
    async fn top_stocks_fall_back_to_empty() {
        let upstream = CannedUpstream::new(Err(UpstreamError::Status { status: 503 }));
        let served = service(upstream).top_stocks().await;

        assert_eq!(served.source, DataSource::Fallback);
        assert!(served.body.stocks.is_empty());
    }

    #[tokio::test]
    async fn health_reports_session_state() {
        let refreshed = Utc.with_ymd_and_hms(2024, 1, 10, 4, 29, 0).unwrap();
        let upstream = Arc::new(CannedUpstream {
            outcome: Err(UpstreamError::Timeout),
            session: SessionSnapshot {
                last_refresh: Some(refreshed),
                valid: true,
            },
            calls: Mutex::new(Vec::new()),
        });

        let health = service(Arc::clone(&upstream)).health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.timestamp, "2024-01-10T04:30:00Z");
        assert_eq!(
            health.cookies_last_updated.as_deref(),
            Some("2024-01-10T04:29:00Z")
        );
        assert!(health.cookies_valid);
        assert!(upstream.calls.lock().is_empty());
    }
}
