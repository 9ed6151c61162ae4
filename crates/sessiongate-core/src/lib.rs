//! sessiongate-core - client-side session handling.
//!
//! A `SessionStore` holds the current token and identity and performs the
//! login exchange. A `NavigationGuard` runs before every route change,
//! validates the persisted token and decides whether to redirect.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;

pub use api::{ApiClient, ApiError, Credentials};
pub use auth::{
    CookieStore, DecodedToken, FileCookieStore, IdentitySource, MemoryCookieStore, SessionSnapshot,
    SessionStore,
};
pub use config::Config;
pub use guard::{Navigation, NavigationGuard, TokenState};
