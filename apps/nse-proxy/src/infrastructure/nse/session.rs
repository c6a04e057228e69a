//! Cookie Session
//!
//! Process-local session cookie shared by every request. A cookie is usable
//! while it is non-empty and younger than the TTL; once invalidated it is
//! cleared but its refresh time is kept for reporting.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::application::ports::{Clock, SessionSnapshot};

#[derive(Debug, Default)]
struct SessionState {
    cookie: String,
    last_refresh: Option<DateTime<Utc>>,
}

/// Shared upstream session cookie.
pub struct CookieSession {
    state: RwLock<SessionState>,
    // Held for the whole refresh so concurrent callers wait instead of
    // refreshing again. Never held while fetching data.
    refresh_gate: Mutex<()>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl CookieSession {
    /// Create an empty session.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            refresh_gate: Mutex::new(()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
        }
    }

    /// The cookie, if it is still valid.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        let state = self.state.read();
        self.is_fresh(&state).then(|| state.cookie.clone())
    }

    /// Whether a valid cookie is held.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_fresh(&self.state.read())
    }

    /// Read-only view for health reporting.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            last_refresh: state.last_refresh,
            valid: self.is_fresh(&state),
        }
    }

    /// Store a freshly issued cookie string.
    pub fn store(&self, cookie: String) {
        let now = self.clock.now();
        let mut state = self.state.write();
        state.cookie = cookie;
        state.last_refresh = Some(now);
    }

    /// Drop the cookie so the next caller refreshes, but only if it is still
    /// the one a rejected request was sent with.
    ///
    /// A rejection for a cookie that has since been replaced leaves the newer
    /// cookie alone. Returns whether anything was cleared.
    pub fn invalidate_if(&self, rejected: &str) -> bool {
        let mut state = self.state.write();
        if state.cookie.is_empty() || state.cookie != rejected {
            return false;
        }
        state.cookie.clear();
        true
    }

    /// Return a valid cookie, running `refresh` first if needed.
    ///
    /// Only one refresh runs at a time; callers queued behind it reuse its
    /// result. A failed refresh is logged and the previous cookie, possibly
    /// empty, is returned.
    pub async fn ensure_with<F, Fut, E>(&self, refresh: F) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
    {
        if let Some(cookie) = self.current() {
            return cookie;
        }

        let _gate = self.refresh_gate.lock().await;

        if let Some(cookie) = self.current() {
            return cookie;
        }

        match refresh().await {
            Ok(cookie) => {
                tracing::info!(empty = cookie.is_empty(), "Session cookies refreshed");
                self.store(cookie.clone());
                cookie
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh session cookies");
                self.state.read().cookie.clone()
            }
        }
    }

    fn is_fresh(&self, state: &SessionState) -> bool {
        if state.cookie.is_empty() {
            return false;
        }

        state
            .last_refresh
            .is_some_and(|at| self.clock.now() - at < self.ttl)
    }
}

impl std::fmt::Debug for CookieSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CookieSession")
            .field("cookie", &"[REDACTED]")
            .field("last_refresh", &state.last_refresh)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
