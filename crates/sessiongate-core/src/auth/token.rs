//! Decoding of the bearer token issued by the backend.
//!
//! The token is a compact JWT. Its payload is decoded but the signature is
//! NOT verified: the client holds no key, and everything derived here is
//! advisory (it drives redirects and display names, not access control).
//! The backend remains the only party that enforces the token.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is empty")]
    Empty,

    #[error("Malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("Token expiry {0} is out of range")]
    ExpiryOutOfRange(i64),

    #[error("Token has no subject")]
    MissingSubject,
}

/// Claims we read from the payload. Anything else is ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    /// String or number, like `user_id` in the login response
    #[serde(deserialize_with = "crate::api::client::string_or_number")]
    sub: Option<String>,
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(default)]
    exp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// `sub` claim, becomes the session's user id
    pub subject: String,
    /// `userName` claim
    pub user_name: String,
    /// `exp` claim in Unix seconds. A token without one never expires here.
    pub expires_at: Option<i64>,
}

impl DecodedToken {
    /// Decode a raw token string without verifying its signature.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TokenError::Empty);
        }

        let data = decode::<Claims>(raw, &DecodingKey::from_secret(&[]), &unverified())?;
        let claims = data.claims;

        Ok(Self {
            subject: claims.sub.ok_or(TokenError::MissingSubject)?,
            user_name: claims.user_name,
            expires_at: claims.exp,
        })
    }

    /// Expired when `exp` lies strictly before `now`; equal is still valid.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.expires_at.map(|exp| exp < now_secs).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Expiry as an instant, used for the cookie's `Expires` attribute.
    pub fn expires_at_datetime(&self) -> Result<Option<DateTime<Utc>>, TokenError> {
        match self.expires_at {
            None => Ok(None),
            Some(exp) => Utc
                .timestamp_opt(exp, 0)
                .single()
                .map(Some)
                .ok_or(TokenError::ExpiryOutOfRange(exp)),
        }
    }
}

/// Validation settings that only parse: no signature, no registered-claim checks.
/// Expiry is compared by the caller so that the strict `<` rule applies.
fn unverified() -> Validation {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

// ============================================================================
// Tests
// ============================================================================
