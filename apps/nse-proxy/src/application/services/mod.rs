//! Application Services
//!
//! Route policies for the relay. See [`MarketDataService`].

mod market_data;

pub use market_data::{
    DataSource, HealthResponse, MarketDataService, MarketStateResponse, Served, ServiceError,
    SymbolsResponse, TopStocksResponse,
};
