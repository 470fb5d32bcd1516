//! Error types for the client library.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error response from the API.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// The error detail object from the API.
    pub error: ErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// The error message text describing what went wrong.
    pub message: String,
}

/// Errors that can occur when calling the chat-completions API.
///
/// None of these are retried by the client; they surface to the caller of
/// the failing request as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// DNS resolution, connection failures, timeouts, socket errors.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// API authentication failure (HTTP 401).
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// SSE event source error.
    #[error("EventSource error: {0}")]
    EventSourceError(#[from] reqwest_eventsource::Error),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded: {retry_after:?}")]
    RateLimitError {
        /// Wait time suggested by the `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },

    /// Client configuration issue.
    ///
    /// Missing API key or an unparsable base URL.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The API rejected the request (non-2xx other than 401, 429 and 5xx).
    #[error("Request error: {0}")]
    RequestError(String),

    /// Unexpected or malformed API response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// API service unavailable (5xx errors).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ClientError {
    /// Maps a non-success HTTP status and its body text to an error.
    ///
    /// The body is parsed as a structured `{"error": {"message": ...}}` payload
    /// when possible, otherwise used verbatim.
    #[must_use]
    pub fn from_status(status: u16, body: String, retry_after: Option<Duration>) -> Self {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map_or(body, |parsed| parsed.error.message);

        match status {
            401 => Self::AuthenticationError(message),
            429 => Self::RateLimitError { retry_after },
            500..=599 => Self::ServiceUnavailable(message),
            _ => Self::RequestError(message),
        }
    }

    /// Check if this is an authentication error.
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }

    /// Check if this is a rate limit error.
    pub const fn is_rate_limit_error(&self) -> bool {
        matches!(self, Self::RateLimitError { .. })
    }

    /// Get the retry-after duration if this is a rate limit error.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitError { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_parses_structured_body() {
        let err = ClientError::from_status(
            401,
            r#"{"error":{"message":"Invalid API key"}}"#.to_string(),
            None,
        );
        assert!(err.is_authentication_error());
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn test_from_status_uses_raw_body() {
        let err = ClientError::from_status(400, "bad things".to_string(), None);
        assert!(matches!(err, ClientError::RequestError(ref m) if m == "bad things"));
    }

    #[test]
    fn test_from_status_rate_limit_and_server_errors() {
        let err = ClientError::from_status(429, String::new(), Some(Duration::from_secs(7)));
        assert!(err.is_rate_limit_error());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));

        let err = ClientError::from_status(503, "overloaded".to_string(), None);
        assert!(matches!(err, ClientError::ServiceUnavailable(_)));
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static("12"),
        );
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(12)));
    }
}
