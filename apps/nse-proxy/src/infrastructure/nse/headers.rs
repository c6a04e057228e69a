//! Browser-Mimicking Headers
//!
//! The upstream blocks clients that do not look like a desktop browser.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};

/// Headers for loading the site root page (cookie refresh).
#[must_use]
pub fn page_headers(user_agent: &str) -> HeaderMap {
    build(&[
        ("user-agent", user_agent),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
        ("accept-language", "en-US,en;q=0.9"),
        ("dnt", "1"),
        ("upgrade-insecure-requests", "1"),
    ])
}

/// Headers for JSON API requests.
#[must_use]
pub fn api_headers(user_agent: &str, referer: &str) -> HeaderMap {
    build(&[
        ("user-agent", user_agent),
        ("accept", "application/json,text/plain,*/*"),
        ("accept-language", "en-US,en;q=0.9"),
        ("referer", referer),
        ("dnt", "1"),
    ])
}

/// Join the `name=value` part of every `Set-Cookie` header with `; `.
///
/// Attributes (`Path`, `Expires`, ...) are dropped, as are headers that are
/// not valid UTF-8.
#[must_use]
pub fn join_set_cookies(headers: &HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

// Invalid names or values are skipped rather than failing the request.
fn build(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        } else {
            tracing::warn!(header = name, "Skipping invalid request header");
        }
    }

    headers
}
