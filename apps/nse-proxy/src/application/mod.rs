//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the route policies and the port interfaces that
//! define how they reach the upstream and the clock.

/// Port interfaces for external systems (upstream site, time source).
pub mod ports;

/// Application services implementing the relay routes.
pub mod services;
