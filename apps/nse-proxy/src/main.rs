//! NSE Proxy Binary
//!
//! Starts the market data relay.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin nse-proxy
//! ```
//!
//! # Environment Variables
//!
//! - `NSE_PROXY_PORT` (or `PORT`): Listen port (default: 3001)
//! - `NSE_PROXY_BIND_ADDR`: Listen address (default: 0.0.0.0)
//! - `NSE_UPSTREAM_BASE_URL`: Upstream site (default: <https://www.nseindia.com>)
//! - `NSE_USER_AGENT`: Browser user agent sent upstream
//! - `NSE_COOKIE_TTL_SECS`: Cookie lifetime (default: 300)
//! - `NSE_SESSION_TIMEOUT_SECS`: Homepage fetch timeout (default: 10)
//! - `NSE_REQUEST_TIMEOUT_SECS`: API fetch timeout (default: 15)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `RUST_LOG`: Log filter (default: nse_proxy=info)

use std::sync::Arc;

use nse_proxy::infrastructure::telemetry;
use nse_proxy::{
    AppState, Clock, HttpServer, MarketDataService, NseClient, ProxyConfig, SystemClock,
    create_router, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv_from_ancestors();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting NSE proxy");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
    }

    let config = ProxyConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let client = Arc::new(NseClient::new(config.upstream.clone(), Arc::clone(&clock))?);
    let service = MarketDataService::new(client, clock);
    let router = create_router(AppState::new(service));

    let addr = config.server.socket_addr();
    let server = HttpServer::new(addr, router, shutdown_token.clone());
    let mut server_task = tokio::spawn(server.run());

    log_endpoints(config.server.port);

    tokio::select! {
        () = await_shutdown(shutdown_token) => {}
        result = &mut server_task => {
            result??;
            return Ok(());
        }
    }

    // In-flight requests drain before the listener returns
    server_task.await??;

    tracing::info!("NSE proxy stopped");
    Ok(())
}

fn log_config(config: &ProxyConfig) {
    tracing::info!(
        addr = %config.server.socket_addr(),
        upstream = %config.upstream.base_url,
        cookie_ttl_secs = config.upstream.cookie_ttl.as_secs(),
        "Configuration loaded"
    );
    tracing::debug!(
        session_timeout_secs = config.upstream.session_timeout.as_secs(),
        request_timeout_secs = config.upstream.request_timeout.as_secs(),
        user_agent = %config.upstream.user_agent,
        "Upstream settings"
    );
}

fn log_endpoints(port: u16) {
    let base = format!("http://localhost:{port}");
    for path in [
        "/api/nse/quote?symbol=RELIANCE",
        "/api/nse/symbols",
        "/api/nse/market-status",
        "/api/nse/top-stocks",
        "/api/health",
        "/metrics",
    ] {
        tracing::info!(endpoint = %format!("{base}{path}"), "Available endpoint");
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
