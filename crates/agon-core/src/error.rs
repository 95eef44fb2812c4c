//! Error types for the AGON client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, HTTP status, storage and input validation
//! failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for AGON client operations.
///
/// Callers that need to tell a rejected session apart from a backend that is
/// still waking up should use [`Error::is_unauthorized`] and
/// [`Error::is_transient`] rather than matching on display strings.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, body decoding).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors raised locally by the client.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP response from the backend.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Token storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad base URL, malformed path or header).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns the HTTP status code if the backend answered with an error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http(err) => Some(err.status),
            _ => None,
        }
    }

    /// True for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// True for a 403 response.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// True when the failure says nothing about the session itself: the
    /// request never got an answer, or the backend answered with a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Http(err) => err.status >= 500,
            _ => false,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Generic HTTP client error.
    #[error("HTTP client error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No access token is stored, so there is no session to act on.
    #[error("no active session")]
    NoSession,
}

/// A non-success response from the backend.
///
/// The backend speaks Django REST Framework, which reports errors as
/// `{"detail": "...", "code": "..."}` or as a map of field errors; the raw
/// body is kept so callers can render field errors themselves.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code (if present).
    pub code: Option<String>,
    /// Human-readable error detail (if present).
    pub detail: Option<String>,
    /// The decoded JSON body, when the body was JSON.
    pub body: Option<serde_json::Value>,
}

impl HttpError {
    /// Create a new HTTP error with no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            code: None,
            detail: None,
            body: None,
        }
    }

    /// Build an error from a status and raw response bytes.
    pub fn from_body(status: u16, bytes: &[u8]) -> Self {
        let body: Option<serde_json::Value> = serde_json::from_slice(bytes).ok();
        let field = |name: &str| {
            body.as_ref()
                .and_then(|b| b.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            status,
            code: field("code"),
            detail: field("detail"),
            body,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

/// Token storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The stored data could not be parsed.
    #[error("corrupt token store {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid backend base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid header value (for example a token with control characters).
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_reads_drf_detail() {
        let err = HttpError::from_body(
            401,
            br#"{"detail":"Given token not valid for any token type","code":"token_not_valid"}"#,
        );
        assert_eq!(err.code.as_deref(), Some("token_not_valid"));
        assert_eq!(
            err.to_string(),
            "HTTP 401 [token_not_valid]: Given token not valid for any token type"
        );
    }

    #[test]
    fn http_error_tolerates_non_json_body() {
        let err = HttpError::from_body(502, b"<html>Bad Gateway</html>");
        assert!(err.body.is_none());
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn classification() {
        let unauthorized = Error::Http(HttpError::new(401));
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_transient());

        let forbidden = Error::Http(HttpError::new(403));
        assert!(forbidden.is_forbidden());

        assert!(Error::Http(HttpError::new(503)).is_transient());
        assert!(Error::Transport(TransportError::Timeout).is_transient());
        assert!(!Error::Auth(AuthError::NoSession).is_transient());
        assert_eq!(Error::Transport(TransportError::Timeout).status(), None);
    }
}
