//! Error types for Deck API calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while fetching board state from Deck.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Credentials were rejected (401/403).
    #[error("Authentication failed: {status} - {message}")]
    Auth { status: u16, message: String },

    /// Board (or endpoint) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure, timeout, throttling or server-side error.
    #[error("Transient error: {0}")]
    Transient(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client itself could not be built.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl DeckError {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: status.as_u16(),
                message,
            },
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                Self::Transient(format!("{status}: {message}"))
            }
            s if s.is_server_error() => Self::Transient(format!("{status}: {message}")),
            _ => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for DeckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Config(err.to_string())
        } else if err.is_decode() {
            Self::Transient(format!("failed to read response body: {err}"))
        } else {
            // Timeouts, connect failures and resets all land here.
            Self::Transient(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            DeckError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            DeckError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            DeckError::from_status(StatusCode::FORBIDDEN, String::new()),
            DeckError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            DeckError::from_status(StatusCode::NOT_FOUND, String::new()),
            DeckError::NotFound(_)
        ));
        assert!(DeckError::from_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(DeckError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(!DeckError::from_status(StatusCode::BAD_REQUEST, String::new()).is_transient());
    }
}
