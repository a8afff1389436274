//! Error types for Google API operations.
//!
//! Every fallible operation in this crate returns a [`GoogleError`]. The
//! [`GoogleErrorCode`] classifies the failure; API errors additionally carry
//! the HTTP status and the raw response body.

use std::fmt;
use thiserror::Error;

/// The category of a Google API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoogleErrorCode {
    /// A REST call returned a non-success HTTP status.
    Api,
    /// The OAuth flow failed: no token, provider-reported error, or the
    /// identity endpoints could not be loaded.
    AuthenticationFailed,
    /// Transport-level failure: connection, DNS, timeout.
    NetworkError,
    /// The server answered with a body that could not be decoded.
    InvalidResponse,
    /// A paginated fetch exceeded its page ceiling.
    PaginationLimitExceeded,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// Internal error - unexpected state, local I/O.
    InternalError,
}

impl GoogleErrorCode {
    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api_error",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::InvalidResponse => "invalid_response",
            Self::PaginationLimitExceeded => "pagination_limit_exceeded",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for GoogleErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to Google.
#[derive(Debug, Error)]
pub struct GoogleError {
    code: GoogleErrorCode,
    message: String,
    /// HTTP status for [`GoogleErrorCode::Api`] errors.
    status: Option<u16>,
    /// Raw response body for [`GoogleErrorCode::Api`] errors.
    body: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GoogleError {
    /// Creates a new error with the given code and message.
    pub fn new(code: GoogleErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            body: None,
            source: None,
        }
    }

    /// Creates an API error from a non-success response.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let mut err = Self::new(GoogleErrorCode::Api, format!("HTTP {}: {}", status, body));
        err.status = Some(status);
        err.body = Some(body);
        err
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::NetworkError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::InvalidResponse, message)
    }

    /// Creates a pagination ceiling error.
    pub fn pagination_limit(max_pages: usize) -> Self {
        Self::new(
            GoogleErrorCode::PaginationLimitExceeded,
            format!("server still returned a page token after {} pages", max_pages),
        )
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::InternalError, message)
    }

    /// Maps a transport failure from `reqwest`.
    pub(crate) fn from_transport(context: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("{}: request timeout", context)
        } else if err.is_connect() {
            format!("{}: connection failed: {}", context, err)
        } else {
            format!("{}: {}", context, err)
        };
        Self::network(message).with_source(err)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> GoogleErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the raw response body of an API error.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns true if the server rejected the credentials (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl fmt::Display for GoogleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for Google operations.
pub type GoogleResult<T> = Result<T, GoogleError>;
