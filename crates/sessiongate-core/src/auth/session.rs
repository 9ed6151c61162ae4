use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::cookie::{CookieStore, SessionCookie};
use super::token::DecodedToken;
use crate::api::{ApiClient, ApiError, Credentials, LoginResponse, LOGIN_UNAVAILABLE_MESSAGE};

/// Where the user's identity comes from after a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Decode `sub`/`userName` out of the issued token.
    #[default]
    DecodeToken,
    /// Trust `user_id`/`name` from the response body, decoding only when
    /// the body leaves them out.
    ResponseFields,
}

/// A logged-in identity. The token and both identity fields exist together
/// or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

/// Plain view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub login_error: Option<String>,
}

/// Handle for one login attempt. Completing it after the session has been
/// reset in the meantime has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTicket {
    generation: u64,
    secure: bool,
}

impl LoginTicket {
    /// Whether the session cookie for this attempt will carry `Secure`.
    pub fn secure(&self) -> bool {
        self.secure
    }
}

pub struct SessionStore {
    client: ApiClient,
    cookies: Box<dyn CookieStore>,
    identity_source: IdentitySource,
    identity: Option<Identity>,
    login_error: Option<String>,
    generation: u64,
}

impl SessionStore {
    pub fn new(client: ApiClient, cookies: Box<dyn CookieStore>) -> Self {
        Self {
            client,
            cookies,
            identity_source: IdentitySource::default(),
            identity: None,
            login_error: None,
            generation: 0,
        }
    }

    pub fn with_identity_source(mut self, source: IdentitySource) -> Self {
        self.identity_source = source;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.token.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.user_id.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cookies(&self) -> &dyn CookieStore {
        self.cookies.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token().map(str::to_string),
            user_id: self.user_id().map(str::to_string),
            username: self.username().map(str::to_string),
            login_error: self.login_error.clone(),
        }
    }

    /// Raw token from the session cookie, if one is still live at `now`.
    pub fn persisted_token(&self, now: DateTime<Utc>) -> Option<String> {
        self.cookies.current_token(now)
    }

    /// Exchange credentials for a token. Never fails: a rejected or broken
    /// attempt only populates `login_error`.
    pub async fn login(&mut self, credentials: &Credentials, backend_base_url: &str) {
        let ticket = self.begin_login(backend_base_url);
        let outcome = self.client.login(backend_base_url, credentials).await;
        self.complete_login(ticket, outcome);
    }

    /// Start a login attempt. Session state is left as-is until the
    /// outcome is applied with [`SessionStore::complete_login`].
    pub fn begin_login(&mut self, backend_base_url: &str) -> LoginTicket {
        LoginTicket {
            generation: self.generation,
            secure: is_secure_transport(backend_base_url),
        }
    }

    /// Apply the outcome of a login attempt. Returns false when the ticket
    /// was invalidated by a reset and the outcome was discarded.
    pub fn complete_login(
        &mut self,
        ticket: LoginTicket,
        outcome: Result<LoginResponse, ApiError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding login outcome for a reset session"
            );
            return false;
        }

        match outcome {
            Ok(response) => self.accept_login(response, ticket.secure),
            Err(e @ ApiError::Rejected { .. }) => {
                warn!(error = %e, "Login rejected");
                self.login_error = Some(e.user_message());
            }
            Err(e) => {
                error!(error = %e, "Login request failed");
                self.login_error = Some(e.user_message());
            }
        }
        true
    }

    fn accept_login(&mut self, response: LoginResponse, secure: bool) {
        let decoded = DecodedToken::decode(&response.token);

        let identity = match (self.identity_source, response.user_id, response.name) {
            (IdentitySource::ResponseFields, Some(user_id), Some(username)) => Identity {
                token: response.token,
                user_id,
                username,
            },
            _ => match &decoded {
                Ok(claims) => Identity {
                    token: response.token,
                    user_id: claims.subject.clone(),
                    username: claims.user_name.clone(),
                },
                Err(e) => {
                    error!(error = %e, "Login returned an undecodable token");
                    self.login_error = Some(LOGIN_UNAVAILABLE_MESSAGE.to_string());
                    return;
                }
            },
        };

        let expires_at = match decoded.map(|claims| claims.expires_at_datetime()) {
            Ok(Ok(at)) => at,
            Ok(Err(e)) | Err(e) => {
                warn!(error = %e, "No usable token expiry, writing session cookie");
                None
            }
        };

        info!(user_id = %identity.user_id, "Logged in");
        self.login_error = None;
        self.cookies
            .store(SessionCookie::new(&identity.token, expires_at, secure));
        self.identity = Some(identity);
    }

    /// Populate identity from a token that is already persisted and valid.
    pub fn rehydrate(&mut self, token: String, claims: &DecodedToken) {
        self.identity = Some(Identity {
            token,
            user_id: claims.subject.clone(),
            username: claims.user_name.clone(),
        });
    }

    /// Clear in-memory session state and invalidate pending logins.
    /// The cookie is left alone.
    pub fn reset(&mut self) {
        self.identity = None;
        self.login_error = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Clear session state and remove the session cookie. Idempotent.
    pub fn logout(&mut self) {
        if self.identity.is_some() {
            info!("Logged out");
        }
        self.reset();
        self.cookies.remove();
    }
}

/// `Secure` is only set when talking to the backend over TLS.
pub(crate) fn is_secure_transport(base_url: &str) -> bool {
    reqwest::Url::parse(base_url)
        .map(|url| url.scheme() == "https")
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
