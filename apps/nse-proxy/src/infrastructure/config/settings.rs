//! Proxy Configuration Settings
//!
//! Configuration types for the relay, loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use reqwest::Url;

/// Default NSE website root.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://www.nseindia.com";

/// Desktop Chrome user agent presented to the upstream.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3001,
        }
    }
}

impl ServerSettings {
    /// Socket address to listen on.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Upstream website settings.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Site root; also the page that issues session cookies.
    pub base_url: Url,
    /// User agent sent on every upstream request.
    pub user_agent: String,
    /// Cookie lifetime before a refresh is forced.
    pub cookie_ttl: Duration,
    /// Deadline for the cookie refresh request.
    pub session_timeout: Duration,
    /// Deadline for data requests.
    pub request_timeout: Duration,
}

impl Default for UpstreamSettings {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_UPSTREAM_BASE_URL)
                .expect("static default upstream URL is valid"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie_ttl: Duration::from_secs(300),
            session_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Complete relay configuration.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Listener settings.
    pub server: ServerSettings,
    /// Upstream settings.
    pub upstream: UpstreamSettings,
}

impl ProxyConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address or base URL cannot be parsed, or
    /// if the base URL is not HTTP(S).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_defaults = ServerSettings::default();
        let upstream_defaults = UpstreamSettings::default();

        let port = lookup("NSE_PROXY_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(server_defaults.port);

        let bind_addr = match lookup("NSE_PROXY_BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NSE_PROXY_BIND_ADDR".to_string(), raw))?,
            None => server_defaults.bind_addr,
        };

        let base_url = match lookup("NSE_UPSTREAM_BASE_URL") {
            Some(raw) => parse_base_url(&raw)?,
            None => upstream_defaults.base_url,
        };

        let user_agent = lookup("NSE_USER_AGENT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(upstream_defaults.user_agent);

        let upstream = UpstreamSettings {
            base_url,
            user_agent,
            cookie_ttl: parse_duration_secs(
                &lookup,
                "NSE_COOKIE_TTL_SECS",
                upstream_defaults.cookie_ttl,
            ),
            session_timeout: parse_duration_secs(
                &lookup,
                "NSE_SESSION_TIMEOUT_SECS",
                upstream_defaults.session_timeout,
            ),
            request_timeout: parse_duration_secs(
                &lookup,
                "NSE_REQUEST_TIMEOUT_SECS",
                upstream_defaults.request_timeout,
            ),
        };

        Ok(Self {
            server: ServerSettings { bind_addr, port },
            upstream,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable holds a value that cannot be used.
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidValue("NSE_UPSTREAM_BASE_URL".to_string(), raw.to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;

    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(invalid())
    }
}

fn parse_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(default, Duration::from_secs)
}
