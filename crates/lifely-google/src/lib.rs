//! Google OAuth token lifecycle and Calendar/UserInfo data access.
//!
//! - [`IdentityClient`] - discovery, consent flow, refresh, revocation and
//!   token validation
//! - [`GoogleCalendarClient`] - user info, calendar list and paginated
//!   event fetches
//! - [`GoogleSession`] - the two above glued to a [`TokenStorage`] file
//!
//! # Example
//!
//! ```ignore
//! use lifely_google::{GoogleConfig, GoogleSession, IdentityClient, OAuthCredentials};
//!
//! let config = GoogleConfig::new();
//! let identity = IdentityClient::new(config)?;
//! let session = GoogleSession::new(identity, OAuthCredentials::new(client_id, None));
//! let client = session.calendar_client().await?;
//! let events = client.fetch_calendar_events(2024, None).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod oauth;
pub mod session;
pub mod tokens;

pub use client::{EVENTS_PAGE_SIZE, GoogleCalendarClient, ProgressFn};
pub use config::{Endpoints, GoogleConfig, OAuthCredentials};
pub use error::{GoogleError, GoogleErrorCode, GoogleResult};
pub use identity::{DiscoveryDocument, IdentityClient};
pub use session::GoogleSession;
pub use tokens::{TokenInfo, TokenResponse, TokenStorage};
