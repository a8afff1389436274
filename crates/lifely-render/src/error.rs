//! Render errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The points file is not a JSON array of `{lat, lng, visits?, label?}`.
    #[error("invalid points data: {0}")]
    InvalidPoints(#[source] serde_json::Error),
}
