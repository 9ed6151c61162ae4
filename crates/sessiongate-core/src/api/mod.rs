//! REST client module for the backend's login endpoint.
//!
//! This module provides the `ApiClient` for exchanging credentials for a
//! bearer token, and `ApiError` for the ways that exchange can fail.
//!
//! The backend issues a JWT from `POST {base}/users/login`.

pub mod client;
pub mod error;

pub use client::{ApiClient, Credentials, LoginResponse};
pub use error::{ApiError, LOGIN_FAILED_MESSAGE, LOGIN_UNAVAILABLE_MESSAGE};
