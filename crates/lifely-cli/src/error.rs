//! Client error types.

use std::fmt;

use lifely_google::{GoogleError, GoogleErrorCode};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Google API or OAuth error.
    Google(GoogleError),
    /// IO error.
    Io(std::io::Error),
    /// Authentication required.
    AuthRequired(String),
    /// Rendering or data format error.
    Render(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Google(err) => write!(f, "google error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::AuthRequired(msg) => write!(f, "authentication required: {}", msg),
            Self::Render(msg) => write!(f, "render error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Google(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<GoogleError> for ClientError {
    fn from(err: GoogleError) -> Self {
        if err.is_unauthorized() {
            return Self::AuthRequired("Google rejected the stored token - run 'lifely auth'".into());
        }
        match err.code() {
            GoogleErrorCode::ConfigurationError => Self::Config(err.message().to_string()),
            _ => Self::Google(err),
        }
    }
}

impl From<lifely_render::RenderError> for ClientError {
    fn from(err: lifely_render::RenderError) -> Self {
        Self::Render(err.to_string())
    }
}
