//! Persistence of the raw session token as a cookie.
//!
//! The cookie is the only state that survives a restart. It carries the
//! token exactly as issued, readable by the client (not HTTP-only),
//! `SameSite=Strict`, `Secure` only over encrypted transport, and expires
//! together with the token itself.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use ::cookie::{Cookie, SameSite};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Cookie name holding the raw token
pub const COOKIE_NAME: &str = "token";

/// Cookie file name in cache directory
const COOKIE_FILE: &str = "cookie.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionCookie {
    inner: Cookie<'static>,
}

impl SessionCookie {
    pub fn new(token: &str, expires_at: Option<DateTime<Utc>>, secure: bool) -> Self {
        let mut builder = Cookie::build((COOKIE_NAME, token.to_string()))
            .path("/")
            .http_only(false)
            .secure(secure)
            .same_site(SameSite::Strict);

        if let Some(at) = expires_at {
            match OffsetDateTime::from_unix_timestamp(at.timestamp()) {
                Ok(when) => builder = builder.expires(when),
                Err(e) => warn!(expires_at = %at, error = %e, "Cookie expiry out of range, writing session cookie"),
            }
        }

        Self {
            inner: builder.build(),
        }
    }

    /// Parse a `Set-Cookie` style string as written by [`SessionCookie::to_header_value`].
    pub fn parse(s: &str) -> Result<Self> {
        let inner = Cookie::parse(s.trim().to_string()).context("Failed to parse session cookie")?;
        if inner.name() != COOKIE_NAME {
            anyhow::bail!("Unexpected cookie name: {}", inner.name());
        }
        Ok(Self { inner })
    }

    pub fn token(&self) -> &str {
        self.inner.value()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .expires_datetime()
            .and_then(|when| Utc.timestamp_opt(when.unix_timestamp(), 0).single())
    }

    pub fn is_secure(&self) -> bool {
        self.inner.secure().unwrap_or(false)
    }

    pub fn is_http_only(&self) -> bool {
        self.inner.http_only().unwrap_or(false)
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.inner.same_site()
    }

    /// A cookie past its `Expires` second is no longer sent, like a browser would.
    /// Compared in whole seconds so it agrees with the token's `exp` check.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at()
            .map(|at| at.timestamp() < now.timestamp())
            .unwrap_or(false)
    }

    pub fn as_cookie(&self) -> &Cookie<'static> {
        &self.inner
    }

    pub fn to_header_value(&self) -> String {
        self.inner.to_string()
    }
}

/// Where the session cookie lives between navigations.
///
/// Implementations swallow their own I/O failures (logging them): a cookie
/// that cannot be read is simply absent.
pub trait CookieStore: Send {
    fn load(&self) -> Option<SessionCookie>;

    fn store(&mut self, cookie: SessionCookie);

    fn remove(&mut self);

    /// Raw token of a cookie that has not yet expired at `now`.
    fn current_token(&self, now: DateTime<Utc>) -> Option<String> {
        self.load()
            .filter(|cookie| !cookie.is_expired_at(now))
            .map(|cookie| cookie.token().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// In-process cookie store.
#[derive(Debug, Default, Clone)]
pub struct MemoryCookieStore {
    cookie: Option<SessionCookie>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a persisted token and no expiry attribute.
    pub fn with_token(token: &str) -> Self {
        Self {
            cookie: Some(SessionCookie::new(token, None, false)),
        }
    }
}

impl CookieStore for MemoryCookieStore {
    fn load(&self) -> Option<SessionCookie> {
        self.cookie.clone()
    }

    fn store(&mut self, cookie: SessionCookie) {
        self.cookie = Some(cookie);
    }

    fn remove(&mut self) {
        self.cookie = None;
    }
}

/// Cookie persisted as a single `Set-Cookie` line in the cache directory.
pub struct FileCookieStore {
    cache_dir: PathBuf,
}

impl FileCookieStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn cookie_path(&self) -> PathBuf {
        self.cache_dir.join(COOKIE_FILE)
    }

    fn try_load(&self) -> Result<Option<SessionCookie>> {
        let path = self.cookie_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read cookie file")?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        SessionCookie::parse(&contents).map(Some)
    }

    fn try_store(&self, cookie: &SessionCookie) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;
        std::fs::write(self.cookie_path(), cookie.to_header_value())
            .context("Failed to write cookie file")?;
        Ok(())
    }

    fn try_remove(&self) -> Result<()> {
        let path = self.cookie_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove cookie file")?;
        }
        Ok(())
    }
}

impl CookieStore for FileCookieStore {
    fn load(&self) -> Option<SessionCookie> {
        match self.try_load() {
            Ok(cookie) => cookie,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session cookie");
                None
            }
        }
    }

    fn store(&mut self, cookie: SessionCookie) {
        match self.try_store(&cookie) {
            Ok(()) => debug!(path = %self.cookie_path().display(), "Session cookie written"),
            Err(e) => warn!(error = %e, "Failed to persist session cookie"),
        }
    }

    fn remove(&mut self) {
        if let Err(e) = self.try_remove() {
            warn!(error = %e, "Failed to remove session cookie");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
