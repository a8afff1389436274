//! Subcommand implementations.

pub mod auth;
pub mod calendars;
pub mod config;
pub mod heatmap;
pub mod revoke;
pub mod whoami;
pub mod wrapped;

use lifely_google::{GoogleSession, IdentityClient};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Opens a session on the stored token using credentials from `config.toml`.
pub(crate) fn open_session(config: &ClientConfig) -> ClientResult<GoogleSession> {
    let settings = config.google_settings();
    let credentials = settings.resolve_credentials().map_err(ClientError::Config)?;
    let google_config = settings.to_google_config().map_err(ClientError::Config)?;
    let identity = IdentityClient::new(google_config)?;
    Ok(GoogleSession::new(identity, credentials))
}
