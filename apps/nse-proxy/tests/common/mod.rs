//! Shared fixtures: a wiremock upstream, a manual clock and the relay router.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Url;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nse_proxy::{
    AppState, Clock, ManualClock, MarketDataService, NseClient, UpstreamSettings, create_router,
};

/// Session cookie issued by the mocked homepage.
pub const SESSION_COOKIE: &str = "nsit=abc123";

/// Wednesday 2024-01-10, 10:00 IST.
pub fn wednesday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 4, 30, 0).unwrap()
}

/// Relay wired to a mock upstream.
pub struct Harness {
    pub upstream: MockServer,
    pub clock: Arc<ManualClock>,
    pub client: Arc<NseClient>,
    pub router: Router,
}

impl Harness {
    pub async fn start() -> Self {
        let upstream = MockServer::start().await;
        let clock = Arc::new(ManualClock::new(wednesday_morning()));

        let settings = UpstreamSettings {
            base_url: Url::parse(&upstream.uri()).unwrap(),
            session_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(2),
            ..UpstreamSettings::default()
        };

        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let client = Arc::new(NseClient::new(settings, Arc::clone(&dyn_clock)).unwrap());
        let service = MarketDataService::new(client.clone(), dyn_clock);
        let router = create_router(AppState::new(service));

        Self {
            upstream,
            clock,
            client,
            router,
        }
    }

    /// Homepage answers with a session cookie.
    pub async fn mount_homepage(&self) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", format!("{SESSION_COOKIE}; Path=/; HttpOnly"))
                    .set_body_string("<html></html>"),
            )
            .mount(&self.upstream)
            .await;
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri).await
    }

    pub async fn send(&self, method: Method, uri: &str) -> TestResponse {
        send(self.router.clone(), method, uri).await
    }

    /// Requests the upstream saw for `path`.
    pub async fn upstream_hits(&self, path: &str) -> usize {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(router: Router, method: Method, uri: &str) -> TestResponse {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}
