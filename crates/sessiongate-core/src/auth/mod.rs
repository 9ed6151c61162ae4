//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `DecodedToken`: Unverified decoding of the backend's JWT claims
//! - `SessionStore`: Current token and identity, with login and logout
//! - `CookieStore`: Persistence of the raw token as a `token` cookie
//!
//! Nothing here verifies token signatures. Session state is advisory and
//! only drives navigation; the backend enforces access.

pub mod cookie;
pub mod session;
pub mod token;

pub use cookie::{CookieStore, FileCookieStore, MemoryCookieStore, SessionCookie, COOKIE_NAME};
pub use session::{Identity, IdentitySource, LoginTicket, SessionSnapshot, SessionStore};
pub use token::{DecodedToken, TokenError};
