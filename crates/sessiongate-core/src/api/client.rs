//! HTTP client for the backend's login endpoint.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::ApiError;

/// Credentials sent to `/users/login`. The identifier travels as `email`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "email")]
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
}

/// Some backends send ids (`user_id`, the `sub` claim) as numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Login client. Clone is cheap - reqwest::Client uses Arc internally.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Create a client that relies on the transport's default timeouts.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn login_url(backend_base_url: &str) -> String {
        format!("{}/users/login", backend_base_url.trim_end_matches('/'))
    }

    /// POST the credentials and return the parsed success body.
    pub async fn login(
        &self,
        backend_base_url: &str,
        credentials: &Credentials,
    ) -> Result<LoginResponse, ApiError> {
        let url = Self::login_url(backend_base_url);
        debug!(url = %url, identifier = %credentials.identifier, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %ApiError::truncate_body(&body), "Login rejected");
            return Err(ApiError::from_status(status, &body));
        }

        let body = response.text().await?;
        serde_json::from_str::<LoginResponse>(&body).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "{}: {}",
                e,
                ApiError::truncate_body(&body)
            ))
        })
    }
}
