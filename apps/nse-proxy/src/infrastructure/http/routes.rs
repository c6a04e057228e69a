//! Route table and handlers.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use tower_http::catch_panic::CatchPanicLayer;

use super::error::ApiError;
use super::response_writer::write_response;
use crate::application::services::{DataSource, MarketDataService, Served};
use crate::domain::quote::normalize_symbol;
use crate::infrastructure::metrics;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Route policies.
    pub service: Arc<MarketDataService>,
}

impl AppState {
    /// Wrap a service for the router.
    #[must_use]
    pub fn new(service: MarketDataService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Relay routes, in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Quote,
    Symbols,
    MarketStatus,
    TopStocks,
    Health,
}

const ROUTE_PREFIXES: [(&str, Route); 5] = [
    ("/api/nse/quote", Route::Quote),
    ("/api/nse/symbols", Route::Symbols),
    ("/api/nse/market-status", Route::MarketStatus),
    ("/api/nse/top-stocks", Route::TopStocks),
    ("/api/health", Route::Health),
];

/// First route whose prefix `path` starts with.
fn route_for(path: &str) -> Option<Route> {
    ROUTE_PREFIXES
        .iter()
        .find(|(prefix, _)| path.starts_with(*prefix))
        .map(|(_, route)| *route)
}

/// Create the relay router with all endpoints.
///
/// Relay routes are selected by path prefix, so `/api/health/` and
/// `/api/nse/quote/?symbol=TCS` reach their handlers. Anything else is a JSON
/// 404, and every answer, including preflights, passes through
/// [`write_response`].
#[must_use]
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/nse/quote", get(quote))
        .route("/api/nse/symbols", get(symbols))
        .route("/api/nse/market-status", get(market_status))
        .route("/api/nse/top-stocks", get(top_stocks))
        .route("/api/health", get(health))
        .route("/metrics", get(metrics_handler))
        .fallback(dispatch_by_prefix)
        .with_state(state);

    with_response_layers(router)
}

// Layers run bottom-up: panics become 500s before the writer adds headers.
fn with_response_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(write_response))
}

async fn dispatch_by_prefix(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    query: Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    if method != Method::GET {
        return Err(ApiError::NotFound);
    }

    match route_for(uri.path()).ok_or(ApiError::NotFound)? {
        Route::Quote => quote(State(state), query).await,
        Route::Symbols => Ok(symbols(State(state)).await),
        Route::MarketStatus => market_status(State(state)).await,
        Route::TopStocks => Ok(top_stocks(State(state)).await),
        Route::Health => Ok(health(State(state)).await),
    }
}

async fn quote(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    metrics::record_request("quote");

    let symbol = params
        .get("symbol")
        .map(String::as_str)
        .and_then(normalize_symbol)
        .ok_or_else(|| ApiError::bad_request("symbol parameter is required"))?;

    let served = state.service.quote(&symbol).await?;
    Ok(respond("quote", served))
}

async fn symbols(State(state): State<AppState>) -> Response {
    metrics::record_request("symbols");
    respond("symbols", state.service.symbols().await)
}

async fn market_status(State(state): State<AppState>) -> Result<Response, ApiError> {
    metrics::record_request("market_status");
    let served = state.service.market_status().await?;
    Ok(respond("market_status", served))
}

async fn top_stocks(State(state): State<AppState>) -> Response {
    metrics::record_request("top_stocks");
    respond("top_stocks", state.service.top_stocks().await)
}

async fn health(State(state): State<AppState>) -> Response {
    metrics::record_request("health");
    Json(state.service.health()).into_response()
}

async fn metrics_handler() -> impl IntoResponse {
    metrics::get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_else(|| "handler panicked".to_string());

    ApiError::Internal(message).into_response()
}

fn respond<T: serde::Serialize>(route: &'static str, served: Served<T>) -> Response {
    if served.source == DataSource::Fallback {
        metrics::record_fallback(route);
    }
    Json(served.body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use test_case::test_case;
    use tower::ServiceExt;

    #[test_case("/api/nse/quote", Some(Route::Quote) ; "exact quote")]
    #[test_case("/api/nse/quote/", Some(Route::Quote) ; "trailing slash")]
    #[test_case("/api/nse/quotes", Some(Route::Quote) ; "longer segment")]
    #[test_case("/api/nse/symbols/all", Some(Route::Symbols) ; "sub path")]
    #[test_case("/api/nse/market-status/", Some(Route::MarketStatus) ; "market status")]
    #[test_case("/api/nse/top-stocks", Some(Route::TopStocks) ; "top stocks")]
    #[test_case("/api/healthz", Some(Route::Health) ; "health prefix")]
    #[test_case("/api/nse", None ; "parent path")]
    #[test_case("/metrics/extra", None ; "metrics is exact")]
    #[test_case("/", None ; "root")]
    fn prefix_selection(path: &str, expected: Option<Route>) {
        assert_eq!(route_for(path), expected);
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error() {
        async fn explode() -> &'static str {
            panic!("boom")
        }

        let router = with_response_layers(Router::new().route("/boom", get(explode)));

        let response = router
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "application/json");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error: boom");
    }
}
