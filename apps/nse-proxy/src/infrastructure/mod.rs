//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the HTTP surface.

/// Clock adapters (system time, manually driven time).
pub mod clock;

/// Configuration loading.
pub mod config;

/// HTTP server, routes and response writer.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// NSE website client and cookie session.
pub mod nse;

/// OpenTelemetry tracing integration.
pub mod telemetry;
