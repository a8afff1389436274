//! OAuth token lifecycle against Google's identity endpoints.
//!
//! An [`IdentityClient`] loads the OpenID discovery document at most once
//! and then runs the consent flow, refreshes, revokes and checks tokens.

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{GoogleConfig, OAuthCredentials};
use crate::error::{GoogleError, GoogleResult};
use crate::oauth::{LoopbackServer, PkceFlow, open_browser};
use crate::tokens::TokenResponse;

/// Endpoints advertised by the provider's OpenID configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revocation_endpoint: String,
}

impl DiscoveryDocument {
    /// Google's published endpoints, for use without a discovery fetch.
    pub fn google() -> Self {
        Self {
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            revocation_endpoint: "https://oauth2.googleapis.com/revoke".to_string(),
        }
    }

    /// Endpoints rooted at `base`, matching [`crate::Endpoints::with_base`].
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorization_endpoint: format!("{}/auth", base),
            token_endpoint: format!("{}/token", base),
            revocation_endpoint: format!("{}/revoke", base),
        }
    }
}

/// Handle on the identity provider.
///
/// Initialization (loading the discovery document) happens on first use
/// and is shared: concurrent first callers wait on the same fetch. A failed
/// initialization is not remembered, so a later call retries it.
#[derive(Debug)]
pub struct IdentityClient {
    config: GoogleConfig,
    http_client: reqwest::Client,
    discovery: OnceCell<DiscoveryDocument>,
}

impl IdentityClient {
    /// Creates a client that will fetch the discovery document on first use.
    pub fn new(config: GoogleConfig) -> GoogleResult<Self> {
        Self::build(config, None)
    }

    /// Creates a client that is already initialized with `discovery`.
    pub fn with_discovery(config: GoogleConfig, discovery: DiscoveryDocument) -> GoogleResult<Self> {
        Self::build(config, Some(discovery))
    }

    fn build(config: GoogleConfig, discovery: Option<DiscoveryDocument>) -> GoogleResult<Self> {
        config.validate().map_err(GoogleError::configuration)?;
        let http_client = config.http_client().map_err(|e| {
            GoogleError::configuration("failed to create HTTP client").with_source(e)
        })?;
        Ok(Self {
            config,
            http_client,
            discovery: OnceCell::new_with(discovery),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Returns true once the discovery document is available.
    pub fn is_initialized(&self) -> bool {
        self.discovery.initialized()
    }

    /// Ensures the discovery document is loaded and returns it.
    ///
    /// Fails with an authentication error when the document cannot be
    /// fetched or parsed.
    pub async fn initialize(&self) -> GoogleResult<&DiscoveryDocument> {
        self.discovery
            .get_or_try_init(|| self.fetch_discovery())
            .await
    }

    async fn fetch_discovery(&self) -> GoogleResult<DiscoveryDocument> {
        let url = &self.config.endpoints.discovery;
        debug!("loading discovery document from {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            GoogleError::authentication("failed to load identity endpoints").with_source(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GoogleError::authentication(format!(
                "failed to load identity endpoints: HTTP {}",
                status.as_u16()
            )));
        }

        let document = response.json::<DiscoveryDocument>().await.map_err(|e| {
            GoogleError::authentication("invalid identity discovery document").with_source(e)
        })?;

        info!("identity endpoints loaded");
        Ok(document)
    }

    /// Runs the interactive consent flow and returns the issued token.
    ///
    /// Opens the consent page in the browser and waits for the redirect,
    /// bounded by the configured consent timeout if any. Fails with an
    /// authentication error when the provider reports an error, the state
    /// does not match, or no access token is issued.
    pub async fn request_access_token(
        &self,
        credentials: &OAuthCredentials,
        scopes: &[String],
    ) -> GoogleResult<TokenResponse> {
        self.request_access_token_with(credentials, scopes, open_browser)
            .await
    }

    /// [`request_access_token`](Self::request_access_token) with a custom
    /// way of presenting the consent URL.
    pub async fn request_access_token_with<F>(
        &self,
        credentials: &OAuthCredentials,
        scopes: &[String],
        present: F,
    ) -> GoogleResult<TokenResponse>
    where
        F: FnOnce(&str),
    {
        let discovery = self.initialize().await?;

        let pkce = PkceFlow::new();
        let server = LoopbackServer::bind(self.config.loopback_port_range).await?;
        let redirect_uri = server.redirect_uri();
        let auth_url = pkce.build_auth_url(
            &discovery.authorization_endpoint,
            &credentials.client_id,
            &redirect_uri,
            scopes,
        )?;

        info!("waiting for consent in the browser");
        debug!("authorization URL: {}", auth_url);
        present(&auth_url);

        let code = server
            .wait_for_callback(self.config.consent_timeout)
            .await?
            .into_code(&pkce.state)?;

        debug!("received authorization code, exchanging for tokens");
        let mut params = vec![
            ("client_id", credentials.client_id.as_str()),
            ("code", code.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        if let Some(secret) = credentials.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let token = self
            .post_token(&discovery.token_endpoint, &params, "token exchange")
            .await?;
        info!("obtained access token");
        Ok(token)
    }

    /// Exchanges a refresh token for a fresh access token.
    pub async fn refresh_access_token(
        &self,
        credentials: &OAuthCredentials,
        refresh_token: &str,
    ) -> GoogleResult<TokenResponse> {
        let discovery = self.initialize().await?;

        let mut params = vec![
            ("client_id", credentials.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = credentials.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let token = self
            .post_token(&discovery.token_endpoint, &params, "token refresh")
            .await?;
        info!("refreshed access token");
        Ok(token)
    }

    async fn post_token(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        what: &str,
    ) -> GoogleResult<TokenResponse> {
        let response = self
            .http_client
            .post(endpoint)
            .form(params)
            .send()
            .await
            .map_err(|e| GoogleError::from_transport(&format!("{} request failed", what), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GoogleError::from_transport("failed to read response", e))?;

        if !status.is_success() {
            return Err(GoogleError::authentication(format!(
                "{} failed ({}): {}",
                what, status, body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            GoogleError::invalid_response(format!("invalid token response: {}", e))
        })?;

        if token.access_token.is_empty() {
            return Err(GoogleError::authentication(format!(
                "{} returned no access token",
                what
            )));
        }
        Ok(token)
    }

    /// Revokes `token` with the provider.
    ///
    /// Only a transport failure is an error; the provider's answer is not
    /// inspected, so revoking an already invalid token succeeds.
    pub async fn revoke_token(&self, token: &str) -> GoogleResult<()> {
        let discovery = self.initialize().await?;

        let response = self
            .http_client
            .post(&discovery.revocation_endpoint)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| GoogleError::from_transport("revocation request failed", e))?;

        debug!("revocation endpoint answered {}", response.status());
        Ok(())
    }

    /// Asks the token introspection endpoint whether `token` is live.
    ///
    /// Fail-closed: returns `true` only on a success status. Any transport
    /// failure is logged and reported as `false`, never as an error.
    pub async fn is_token_valid(&self, token: &str) -> bool {
        let result = self
            .http_client
            .post(&self.config.endpoints.tokeninfo)
            .form(&[("access_token", token)])
            .send()
            .await;

        match result {
            Ok(response) => {
                let valid = response.status().is_success();
                debug!("tokeninfo answered {}", response.status());
                valid
            }
            Err(e) => {
                warn!("token validation request failed: {}", e);
                false
            }
        }
    }
}
