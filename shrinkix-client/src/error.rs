//! Client-side error types.
//!
//! This module provides [`ClientError`], the error type for failures that keep
//! a call from producing a [`CompressionResult`](crate::CompressionResult).
//!
//! A server that answers with a non-200 status is *not* an error at this
//! level: it is reported as [`CompressionResult::Error`](crate::CompressionResult::Error)
//! so callers can tell "could not reach the server" apart from "the server
//! rejected the request".

use std::time::Duration;

/// Failures that prevent an API call from yielding a classified response.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (connection refused, DNS, reset, body read failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built (bad URL, header value, unreadable file).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Returns `true` when the failure happened before any status code was
    /// received (connection problems and timeouts).
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout(_))
    }

    /// Returns `true` if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Transport(msg) | ClientError::InvalidRequest(msg) => msg.clone(),
            ClientError::Timeout(after) => format!("no response within {after:?}"),
        }
    }
}

impl From<http::Error> for ClientError {
    fn from(err: http::Error) -> Self {
        ClientError::InvalidRequest(format!("failed to build request: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(ClientError::Transport("connection refused".into()).is_transport());
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(!ClientError::InvalidRequest("bad uri".into()).is_transport());
    }

    #[test]
    fn test_timeout_flag() {
        assert!(ClientError::Timeout(Duration::from_millis(5)).is_timeout());
        assert!(!ClientError::Transport("reset".into()).is_timeout());
    }

    #[test]
    fn test_display() {
        let err = ClientError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "transport error: connection refused");

        let err = ClientError::InvalidRequest("empty API key".into());
        assert_eq!(err.to_string(), "invalid request: empty API key");
        assert_eq!(err.message(), "empty API key");
    }

    #[test]
    fn test_from_http_error() {
        let err = http::Request::builder()
            .header("x-api-key", "bad\nvalue")
            .body(())
            .unwrap_err();
        let err: ClientError = err.into();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
