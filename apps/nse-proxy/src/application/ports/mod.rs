//! Port Interfaces
//!
//! Driven ports used by the market data service:
//!
//! - `UpstreamPort`: the NSE website, reached with a managed session
//! - `Clock`: wall-clock time, replaceable in tests

mod clock_port;
mod upstream_port;

pub use clock_port::Clock;
pub use upstream_port::{Endpoint, SessionSnapshot, UpstreamError, UpstreamPort};
