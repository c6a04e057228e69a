#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! NSE Proxy - Market Data Relay
//!
//! An HTTP relay that forwards a fixed set of market-data queries to the
//! NSE website with browser-like headers and a shared session cookie, and
//! answers browsers with CORS-friendly JSON. When the upstream refuses or
//! fails, plausible fallback data is served instead.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Records and pure rules
//!   - `quote`: Quote record, symbol normalization, deterministic fallback
//!   - `market_status`: Trading-hours rule in IST
//!   - `listing`: Symbol list and top-stock extraction
//!
//! - **Application**: Ports and route policies
//!   - `ports`: Upstream and clock interfaces
//!   - `services`: Fetch, shape-check and fallback per route
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `nse`: Upstream client, browser headers, cookie session
//!   - `http`: Axum router, response writer, listener
//!   - `config`: Environment configuration
//!   - `metrics`, `telemetry`: Observability
//!
//! # Request Flow
//!
//! ```text
//! Browser ──► Response Writer ──► Handler ──► MarketDataService ──► NseClient ──► nseindia.com
//!                                                   │                   │
//!                                                   ▼                   ▼
//!                                             fallback data       CookieSession
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Records and rules with no I/O.
pub mod domain;

/// Application layer - Ports and route policies.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::listing::TopStock;
pub use domain::market_status::{MarketStatus, MarketStatusRecord, TradingHours};
pub use domain::quote::{QuoteRecord, normalize_symbol, stable_hash};

// Application
pub use application::ports::{Clock, Endpoint, SessionSnapshot, UpstreamError, UpstreamPort};
pub use application::services::{DataSource, MarketDataService, ServiceError};

// Infrastructure config
pub use infrastructure::config::{ConfigError, ProxyConfig, ServerSettings, UpstreamSettings};

// Upstream client
pub use infrastructure::clock::{ManualClock, SystemClock};
pub use infrastructure::nse::{CookieSession, NseClient, NseClientError};

// HTTP server
pub use infrastructure::http::{AppState, HttpServer, HttpServerError, create_router};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
