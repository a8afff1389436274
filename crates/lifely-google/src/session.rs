//! Stored-token session: consent, refresh and sign-out around a token file.

use tracing::{debug, info};

use crate::client::GoogleCalendarClient;
use crate::config::OAuthCredentials;
use crate::error::{GoogleError, GoogleResult};
use crate::identity::IdentityClient;
use crate::tokens::{TokenInfo, TokenStorage};

/// Ties an [`IdentityClient`] to persisted tokens.
#[derive(Debug)]
pub struct GoogleSession {
    identity: IdentityClient,
    credentials: OAuthCredentials,
    storage: TokenStorage,
}

impl GoogleSession {
    /// Creates a session storing tokens at the identity config's token path.
    pub fn new(identity: IdentityClient, credentials: OAuthCredentials) -> Self {
        let storage = TokenStorage::new(&identity.config().token_path);
        Self {
            identity,
            credentials,
            storage,
        }
    }

    /// The identity client.
    pub fn identity(&self) -> &IdentityClient {
        &self.identity
    }

    /// The token storage.
    pub fn storage(&self) -> &TokenStorage {
        &self.storage
    }

    /// Returns true when stored tokens cover the configured scopes.
    pub fn has_usable_tokens(&self) -> GoogleResult<bool> {
        let scopes = &self.identity.config().scopes;
        Ok(self
            .storage
            .load()?
            .is_some_and(|t| t.has_scopes(scopes) && (!t.is_expired() || t.refresh_token.is_some())))
    }

    /// Runs the consent flow and stores the result.
    ///
    /// Without `force`, existing usable tokens are kept and no browser is
    /// opened.
    pub async fn authenticate(&self, force: bool) -> GoogleResult<TokenInfo> {
        if !force
            && self.has_usable_tokens()?
            && let Some(tokens) = self.storage.load()?
        {
            info!("already authenticated");
            return Ok(tokens);
        }

        let response = self
            .identity
            .request_access_token(&self.credentials, &self.identity.config().scopes)
            .await?;
        let tokens = TokenInfo::from_response(response);
        self.storage.save(&tokens)?;
        info!("authentication successful");
        Ok(tokens)
    }

    /// Returns a live access token, refreshing and saving it when expired.
    pub async fn access_token(&self) -> GoogleResult<String> {
        let mut tokens = self
            .storage
            .load()?
            .ok_or_else(|| GoogleError::authentication("not authenticated - run 'lifely auth'"))?;

        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        let refresh_token = tokens.refresh_token.clone().ok_or_else(|| {
            GoogleError::authentication("token expired and no refresh token - run 'lifely auth'")
        })?;

        debug!("refreshing expired access token");
        let response = self
            .identity
            .refresh_access_token(&self.credentials, &refresh_token)
            .await?;
        tokens.apply_refresh(response);
        self.storage.save(&tokens)?;
        Ok(tokens.access_token)
    }

    /// Builds a calendar client with a live access token.
    pub async fn calendar_client(&self) -> GoogleResult<GoogleCalendarClient> {
        let token = self.access_token().await?;
        GoogleCalendarClient::new(token, self.identity.config())
    }

    /// Revokes the stored token with the provider and deletes the file.
    ///
    /// Returns false when there was nothing to revoke.
    pub async fn sign_out(&self) -> GoogleResult<bool> {
        let Some(tokens) = self.storage.load()? else {
            return Ok(false);
        };

        // Revoking the refresh token also invalidates its access tokens.
        let token = tokens.refresh_token.as_deref().unwrap_or(&tokens.access_token);
        self.identity.revoke_token(token).await?;
        self.storage.clear()?;
        info!("signed out");
        Ok(true)
    }
}
