//! Navigation guard run before every client-side route change.
//!
//! The guard reads the persisted token, classifies it, brings the session
//! store in line with it and decides whether the navigation may proceed.
//! Expired, malformed and missing tokens are treated alike and never
//! reach session state.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::auth::{DecodedToken, SessionStore};

/// Unauthenticated landing page
pub const DEFAULT_ENTRY_ROUTE: &str = "/";

/// Where an authenticated user is sent instead of the entry page
pub const DEFAULT_LANDING_ROUTE: &str = "/ideas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(String),
}

/// What the persisted token looks like at navigation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    Absent,
    Malformed,
    Expired,
    Valid { raw: String, claims: DecodedToken },
}

impl TokenState {
    /// Classify a persisted token. Expiry is checked before any claim is trusted.
    pub fn inspect(raw: Option<String>, now_secs: i64) -> Self {
        let Some(raw) = raw else {
            return TokenState::Absent;
        };

        match DecodedToken::decode(&raw) {
            Err(e) => {
                warn!(error = %e, "Failed to decode token");
                TokenState::Malformed
            }
            Ok(claims) if claims.is_expired_at(now_secs) => TokenState::Expired,
            Ok(claims) => TokenState::Valid { raw, claims },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationGuard {
    entry_route: String,
    landing_route: String,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_ROUTE, DEFAULT_LANDING_ROUTE)
    }
}

impl NavigationGuard {
    pub fn new(entry_route: impl Into<String>, landing_route: impl Into<String>) -> Self {
        Self {
            entry_route: entry_route.into(),
            landing_route: landing_route.into(),
        }
    }

    pub fn entry_route(&self) -> &str {
        &self.entry_route
    }

    pub fn landing_route(&self) -> &str {
        &self.landing_route
    }

    pub fn before_each(&self, to: &str, session: &mut SessionStore) -> Navigation {
        self.before_each_at(to, session, Utc::now())
    }

    /// Resolve one navigation to `to` as of `now`.
    pub fn before_each_at(
        &self,
        to: &str,
        session: &mut SessionStore,
        now: DateTime<Utc>,
    ) -> Navigation {
        let on_entry = route_path(to) == route_path(&self.entry_route);

        match TokenState::inspect(session.persisted_token(now), now.timestamp()) {
            TokenState::Valid { raw, claims } => session.rehydrate(raw, &claims),
            state => {
                debug!(?state, to = %to, "No valid session, logging out");
                session.logout();
                if !on_entry {
                    return Navigation::Redirect(self.entry_route.clone());
                }
            }
        }

        if on_entry && session.is_authenticated() {
            return Navigation::Redirect(self.landing_route.clone());
        }

        Navigation::Proceed
    }
}

/// Path component of a route, without query or fragment.
fn route_path(route: &str) -> &str {
    route.split(|c: char| c == '?' || c == '#').next().unwrap_or(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::token::tests::mint;
    use crate::auth::{CookieStore, MemoryCookieStore, SessionCookie};
    use chrono::TimeZone;

    fn store_with(token: Option<&str>) -> SessionStore {
        let cookies = match token {
            Some(t) => MemoryCookieStore::with_token(t),
            None => MemoryCookieStore::new(),
        };
        SessionStore::new(ApiClient::new().unwrap(), Box::new(cookies))
    }

    #[test]
    fn test_route_path_strips_query_and_fragment() {
        assert_eq!(route_path("/"), "/");
        assert_eq!(route_path("/?next=/ideas"), "/");
        assert_eq!(route_path("/ideas#top"), "/ideas");
        assert_eq!(route_path(""), "");
    }

    #[test]
    fn test_inspect_states() {
        assert_eq!(TokenState::inspect(None, 100), TokenState::Absent);
        assert_eq!(TokenState::inspect(Some("junk".to_string()), 100), TokenState::Malformed);

        let expired = mint("u1", "alice", 99);
        assert_eq!(TokenState::inspect(Some(expired), 100), TokenState::Expired);

        let edge = mint("u1", "alice", 100);
        assert!(matches!(TokenState::inspect(Some(edge), 100), TokenState::Valid { .. }));
    }

    #[test]
    fn test_expired_token_on_entry_route_stays() {
        let now = Utc::now();
        let token = mint("u1", "alice", now.timestamp() - 10);
        let mut session = store_with(Some(&token));
        let guard = NavigationGuard::default();

        assert_eq!(guard.before_each_at("/", &mut session, now), Navigation::Proceed);
        assert!(!session.is_authenticated());
        assert!(session.cookies().load().is_none());
    }

    #[test]
    fn test_cookie_expiring_this_second_still_valid() {
        let exp = 1_900_000_000;
        let expires = Utc.timestamp_opt(exp, 0).unwrap();
        let mut cookies = MemoryCookieStore::new();
        cookies.store(SessionCookie::new(&mint("u1", "alice", exp), Some(expires), false));
        let mut session = SessionStore::new(ApiClient::new().unwrap(), Box::new(cookies));

        let now = expires + chrono::Duration::milliseconds(500);
        let nav = NavigationGuard::default().before_each_at("/ideas", &mut session, now);

        assert_eq!(nav, Navigation::Proceed);
        assert_eq!(session.user_id(), Some("u1"));

        let later = expires + chrono::Duration::seconds(1);
        let nav = NavigationGuard::default().before_each_at("/ideas", &mut session, later);
        assert_eq!(nav, Navigation::Redirect("/".to_string()));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_malformed_token_matches_absent() {
        let now = Utc::now();
        let guard = NavigationGuard::default();

        for target in ["/", "/settings"] {
            let mut malformed = store_with(Some("definitely.not.jwt"));
            let mut absent = store_with(None);
            let a = guard.before_each_at(target, &mut malformed, now);
            let b = guard.before_each_at(target, &mut absent, now);
            assert_eq!(a, b);
            assert_eq!(malformed.snapshot(), absent.snapshot());
        }
    }

    #[test]
    fn test_custom_routes() {
        let now = Utc::now();
        let token = mint("u1", "alice", now.timestamp() + 60);
        let guard = NavigationGuard::new("/login", "/home");

        let mut session = store_with(Some(&token));
        assert_eq!(
            guard.before_each_at("/login?from=x", &mut session, now),
            Navigation::Redirect("/home".to_string())
        );

        let mut session = store_with(None);
        assert_eq!(
            guard.before_each_at("/", &mut session, now),
            Navigation::Redirect("/login".to_string())
        );
    }
}
