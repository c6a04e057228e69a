//! NSE Website Adapter
//!
//! Implements `UpstreamPort` against www.nseindia.com:
//!
//! - **session**: shared cookie cache with TTL and single-flight refresh
//! - **headers**: browser-mimicking request headers
//! - **client**: reqwest client issuing page and API requests

pub mod client;
pub mod headers;
pub mod session;

pub use client::{NseClient, NseClientError};
pub use session::CookieSession;
