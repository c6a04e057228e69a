//! NSE HTTP Client
//!
//! Issues the page request that mints session cookies and the JSON API
//! requests behind it. There is no retry loop: a 403/451 only invalidates
//! the session so the next request starts with a fresh cookie.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use super::headers;
use super::session::CookieSession;
use crate::application::ports::{Clock, Endpoint, SessionSnapshot, UpstreamError, UpstreamPort};
use crate::infrastructure::config::UpstreamSettings;
use crate::infrastructure::metrics;

const FNO_SECURITIES_QUERY: &str = "index=SECURITIES%20IN%20F%26O";
const NIFTY_50_QUERY: &str = "index=NIFTY%2050";

/// Errors constructing the client.
#[derive(Debug, thiserror::Error)]
pub enum NseClientError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Client for the NSE website with a shared cookie session.
#[derive(Debug)]
pub struct NseClient {
    http: Client,
    settings: UpstreamSettings,
    session: CookieSession,
}

impl NseClient {
    /// Create a client from upstream settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(settings: UpstreamSettings, clock: Arc<dyn Clock>) -> Result<Self, NseClientError> {
        let http = Client::builder().build()?;
        let session = CookieSession::new(settings.cookie_ttl, clock);

        Ok(Self {
            http,
            settings,
            session,
        })
    }

    /// The shared cookie session.
    #[must_use]
    pub const fn cookie_session(&self) -> &CookieSession {
        &self.session
    }

    /// Make sure a usable cookie is held, refreshing if it is stale or empty.
    ///
    /// Refresh failures are logged, not returned; the previous cookie (which
    /// may be empty) is handed back instead.
    pub async fn ensure_session(&self) -> String {
        self.session.ensure_with(|| self.refresh_cookies()).await
    }

    /// Absolute URL of an API endpoint.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.settings.base_url.clone();

        match endpoint {
            Endpoint::Quote { symbol } => {
                url.set_path("/api/quote-equity");
                url.query_pairs_mut().clear().append_pair("symbol", symbol);
            }
            Endpoint::FnoSecurities => {
                url.set_path("/api/equity-stockIndices");
                url.set_query(Some(FNO_SECURITIES_QUERY));
            }
            Endpoint::MarketStatus => {
                url.set_path("/api/marketStatus");
                url.set_query(None);
            }
            Endpoint::Nifty50 => {
                url.set_path("/api/equity-stockIndices");
                url.set_query(Some(NIFTY_50_QUERY));
            }
        }

        url
    }

    async fn refresh_cookies(&self) -> Result<String, UpstreamError> {
        tracing::info!(url = %self.settings.base_url, "Refreshing session cookies");

        let result = self
            .http
            .get(self.settings.base_url.clone())
            .headers(headers::page_headers(&self.settings.user_agent))
            .timeout(self.settings.session_timeout)
            .send()
            .await
            .map_err(transport_error)
            .and_then(|response| {
                let status = response.status();
                if status.is_success() {
                    Ok(headers::join_set_cookies(response.headers()))
                } else {
                    Err(UpstreamError::Status {
                        status: status.as_u16(),
                    })
                }
            });

        metrics::record_cookie_refresh(result.is_ok());
        result
    }

    async fn get_json(&self, url: Url, cookie: &str) -> Result<Value, UpstreamError> {
        let mut request = self
            .http
            .get(url)
            .headers(headers::api_headers(
                &self.settings.user_agent,
                self.settings.base_url.as_str(),
            ))
            .timeout(self.settings.request_timeout);

        if !cookie.is_empty() {
            match HeaderValue::from_str(cookie) {
                Ok(value) => request = request.header(COOKIE, value),
                Err(_) => tracing::warn!("Session cookie is not a valid header value, sending without it"),
            }
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if matches!(
            status,
            StatusCode::FORBIDDEN | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS
        ) {
            if self.session.invalidate_if(cookie) {
                metrics::record_cookie_invalidation();
                tracing::warn!(status = status.as_u16(), "Session rejected, cookies invalidated");
            } else {
                tracing::debug!(
                    status = status.as_u16(),
                    "Rejected cookie already replaced, keeping current session"
                );
            }
            return Err(UpstreamError::AuthRejected {
                status: status.as_u16(),
            });
        }

        if status != StatusCode::OK {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidJson(e.to_string()))
    }
}

#[async_trait]
impl UpstreamPort for NseClient {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, UpstreamError> {
        let cookie = self.ensure_session().await;
        let url = self.endpoint_url(endpoint);

        tracing::debug!(endpoint = endpoint.name(), url = %url, "Upstream request");

        let started = Instant::now();
        let result = self.get_json(url, &cookie).await;
        let outcome = result.as_ref().map_or_else(UpstreamError::kind, |_| "ok");
        metrics::record_upstream_request(endpoint.name(), outcome, started.elapsed());

        result
    }

    fn session(&self) -> SessionSnapshot {
        self.session.snapshot()
    }
}

fn transport_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;

    fn client_for(base: &str) -> NseClient {
        let settings = UpstreamSettings {
            base_url: Url::parse(base).unwrap(),
            ..UpstreamSettings::default()
        };
        NseClient::new(settings, Arc::new(SystemClock)).unwrap()
    }

    #[test]
    fn endpoint_urls_match_upstream_api() {
        let client = client_for("https://www.nseindia.com");

        assert_eq!(
            client
                .endpoint_url(&Endpoint::Quote {
                    symbol: "M&M".to_string()
                })
                .as_str(),
            "https://www.nseindia.com/api/quote-equity?symbol=M%26M"
        );
        assert_eq!(
            client.endpoint_url(&Endpoint::FnoSecurities).as_str(),
            "https://www.nseindia.com/api/equity-stockIndices?index=SECURITIES%20IN%20F%26O"
        );
        assert_eq!(
            client.endpoint_url(&Endpoint::MarketStatus).as_str(),
            "https://www.nseindia.com/api/marketStatus"
        );
        assert_eq!(
            client.endpoint_url(&Endpoint::Nifty50).as_str(),
            "https://www.nseindia.com/api/equity-stockIndices?index=NIFTY%2050"
        );
    }

    #[test]
    fn endpoint_urls_keep_host_and_port() {
        let client = client_for("http://127.0.0.1:9999/");
        assert_eq!(
            client.endpoint_url(&Endpoint::MarketStatus).as_str(),
            "http://127.0.0.1:9999/api/marketStatus"
        );
    }

    #[test]
    fn new_client_has_no_session() {
        let client = client_for("https://www.nseindia.com");
        let snapshot = UpstreamPort::session(&client);
        assert!(!snapshot.valid);
        assert!(snapshot.last_refresh.is_none());
    }
}
