use crate::api::error::ErrorBody;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unable to reach the server: {0}")]
    Network(String),
    #[error("Request timed out. Please try again.")]
    Timeout,
    /// Non-2xx answer; `message` is the server's `error` field when present.
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Builds an HTTP error from a raw response body.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            message: error_message(body),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(format!("Failed to decode response: {err}"))
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Prefers the `{success: false, error}` envelope, falling back to the trimmed body.
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorBody>(body) {
        if !envelope.error.is_empty() {
            return envelope.error;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_server_error_message() {
        let err = ClientError::from_body(409, r#"{"success":false,"error":"Email already exists"}"#);
        assert_eq!(err.to_string(), "Email already exists");
        assert_eq!(err.status(), Some(409));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn falls_back_to_trimmed_body() {
        let err = ClientError::from_body(502, "  Bad Gateway\n");
        assert_eq!(err.to_string(), "Bad Gateway");

        let err = ClientError::from_body(500, "");
        assert_eq!(err.to_string(), "Request failed.");

        let long = "x".repeat(500);
        let err = ClientError::from_body(500, &long);
        assert_eq!(err.to_string().len(), MAX_ERROR_CHARS);
    }

    #[test]
    fn unauthorized_is_detected() {
        let err = ClientError::from_body(401, r#"{"success":false,"error":"Invalid or expired token"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(ClientError::Timeout.status(), None);
    }
}
