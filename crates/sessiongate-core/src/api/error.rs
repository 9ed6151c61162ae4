use serde::Deserialize;
use thiserror::Error;

/// Shown when the backend rejects the login without saying why.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// Shown when no usable response came back at all.
pub const LOGIN_UNAVAILABLE_MESSAGE: &str = "An error occurred. Please try again later.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Login rejected with status {status}")]
    Rejected {
        status: reqwest::StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build a rejection from a non-success response, keeping the server's
    /// `error` field when the body carries one.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        ApiError::Rejected { status, message }
    }

    /// Human-readable text for the session's login error.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message: Some(m), .. } => m.clone(),
            ApiError::Rejected { message: None, .. } => LOGIN_FAILED_MESSAGE.to_string(),
            ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => {
                LOGIN_UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_server_message() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"error":"bad credentials"}"#);
        assert_eq!(err.user_message(), "bad credentials");
    }

    #[test]
    fn test_from_status_falls_back() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.user_message(), LOGIN_FAILED_MESSAGE);

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":""}"#);
        assert_eq!(err.user_message(), LOGIN_FAILED_MESSAGE);

        let err = ApiError::from_status(StatusCode::FORBIDDEN, "");
        assert_eq!(err.user_message(), LOGIN_FAILED_MESSAGE);
    }

    #[test]
    fn test_invalid_response_message() {
        let err = ApiError::InvalidResponse("missing token".to_string());
        assert_eq!(err.user_message(), LOGIN_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }
}
