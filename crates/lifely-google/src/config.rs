//! Google client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// OAuth 2.0 client credentials.
///
/// Users register their own desktop client in the Google Cloud Console.
/// Desktop clients are issued a secret that Google still expects on the
/// token exchange, so it is optional here but normally present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret, if the client type has one.
    pub client_secret: Option<String>,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports the Cloud Console download (`installed` or `web` section) and a
/// flat layout with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    #[serde(default)]
    client_secret: Option<String>,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Loads OAuth credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a Google credentials JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        match file.client_id {
            Some(client_id) => Ok(Self::new(client_id, file.client_secret)),
            None => Err(
                "credentials file must contain an 'installed'/'web' section or a root 'client_id'"
                    .to_string(),
            ),
        }
    }

    /// Checks that the client ID looks like a Google OAuth client ID.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.as_deref() == Some("") {
            return Err("client_secret must not be empty when set");
        }
        Ok(())
    }
}

/// REST endpoints used by the clients.
///
/// Defaults point at Google; tests and proxies substitute their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Base URL of the Calendar v3 API.
    pub calendar_api: String,
    /// OpenID user info endpoint.
    pub userinfo: String,
    /// OpenID Connect discovery document.
    pub discovery: String,
    /// Token introspection endpoint.
    pub tokeninfo: String,
}

impl Endpoints {
    pub const CALENDAR_API: &'static str = "https://www.googleapis.com/calendar/v3";
    pub const DISCOVERY: &'static str =
        "https://accounts.google.com/.well-known/openid-configuration";
    pub const TOKENINFO: &'static str = "https://oauth2.googleapis.com/tokeninfo";
    pub const USERINFO: &'static str = "https://openidconnect.googleapis.com/v1/userinfo";

    /// Points every endpoint at `base` (e.g. a local fake server).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            calendar_api: format!("{}/calendar/v3", base),
            userinfo: format!("{}/userinfo", base),
            discovery: format!("{}/.well-known/openid-configuration", base),
            tokeninfo: format!("{}/tokeninfo", base),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            calendar_api: Self::CALENDAR_API.to_string(),
            userinfo: Self::USERINFO.to_string(),
            discovery: Self::DISCOVERY.to_string(),
            tokeninfo: Self::TOKENINFO.to_string(),
        }
    }
}

/// Configuration shared by the identity and calendar clients.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// REST endpoints.
    pub endpoints: Endpoints,

    /// OAuth scopes to request. Defaults to [`GoogleConfig::DEFAULT_SCOPES`].
    pub scopes: Vec<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// Port range for the loopback OAuth redirect.
    pub loopback_port_range: (u16, u16),

    /// How long to wait for the user on the consent page.
    ///
    /// `None` waits until the user completes or dismisses the prompt.
    pub consent_timeout: Option<Duration>,

    /// Page ceiling for paginated event fetches.
    pub max_pages: usize,

    /// Where the CLI persists tokens.
    pub token_path: PathBuf,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default page ceiling. At 2500 events per page this is far beyond any
    /// real calendar year.
    pub const DEFAULT_MAX_PAGES: usize = 100;

    /// Fixed read-only scope list.
    pub const DEFAULT_SCOPES: &'static [&'static str] = &[
        "https://www.googleapis.com/auth/calendar.readonly",
        "https://www.googleapis.com/auth/userinfo.email",
        "https://www.googleapis.com/auth/userinfo.profile",
    ];

    /// Creates a configuration with Google's endpoints and defaults.
    pub fn new() -> Self {
        Self {
            endpoints: Endpoints::default(),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("lifely/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: (8080, 8090),
            consent_timeout: None,
            max_pages: Self::DEFAULT_MAX_PAGES,
            token_path: Self::default_token_path(),
        }
    }

    /// Returns the default token storage path.
    pub fn default_token_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lifely")
            .join("google-token.json")
    }

    /// Sets the endpoints.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the loopback port range for OAuth.
    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    /// Bounds the wait on the consent page.
    pub fn with_consent_timeout(mut self, timeout: Duration) -> Self {
        self.consent_timeout = Some(timeout);
        self
    }

    /// Sets the page ceiling for event fetches.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the token storage path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }
        if self.max_pages == 0 {
            return Err("max_pages must be at least 1".to_string());
        }
        for url in [
            &self.endpoints.calendar_api,
            &self.endpoints.userinfo,
            &self.endpoints.discovery,
            &self.endpoints.tokeninfo,
        ] {
            url::Url::parse(url).map_err(|e| format!("invalid endpoint {:?}: {}", url, e))?;
        }
        Ok(())
    }

    /// Builds the HTTP client used for every request.
    pub(crate) fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_validation() {
        let valid = OAuthCredentials::new("test-client.apps.googleusercontent.com", None);
        assert!(valid.validate().is_ok());

        assert!(OAuthCredentials::new("", None).validate().is_err());
        assert!(OAuthCredentials::new("bad-id", None).validate().is_err());
        assert!(
            OAuthCredentials::new("x.apps.googleusercontent.com", Some(String::new()))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn credentials_from_json_installed() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "project_id": "my-project"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("test-secret"));
    }

    #[test]
    fn credentials_from_json_flat_without_secret() {
        let json = r#"{"client_id": "flat-id.apps.googleusercontent.com"}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "flat-id.apps.googleusercontent.com");
        assert!(creds.client_secret.is_none());
    }

    #[test]
    fn credentials_from_json_invalid() {
        let result = OAuthCredentials::from_json(r#"{ "other": {} }"#);
        assert!(result.unwrap_err().contains("client_id"));

        let result = OAuthCredentials::from_json("not json");
        assert!(result.unwrap_err().contains("parse"));
    }

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::new();
        assert_eq!(config.scopes.len(), 3);
        assert!(config.scopes[0].ends_with("calendar.readonly"));
        assert_eq!(config.max_pages, GoogleConfig::DEFAULT_MAX_PAGES);
        assert!(config.consent_timeout.is_none());
        assert_eq!(config.endpoints.calendar_api, Endpoints::CALENDAR_API);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn endpoints_with_base() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:9999/");
        assert_eq!(endpoints.calendar_api, "http://127.0.0.1:9999/calendar/v3");
        assert_eq!(endpoints.tokeninfo, "http://127.0.0.1:9999/tokeninfo");
    }

    #[test]
    fn config_validation() {
        assert!(GoogleConfig::new().with_scopes(vec![]).validate().is_err());
        assert!(GoogleConfig::new().with_max_pages(0).validate().is_err());
        assert!(
            GoogleConfig::new()
                .with_loopback_port_range(9010, 9000)
                .validate()
                .is_err()
        );

        let mut bad_url = GoogleConfig::new();
        bad_url.endpoints.tokeninfo = "not a url".to_string();
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn config_builder_methods() {
        let config = GoogleConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_consent_timeout(Duration::from_secs(120))
            .with_max_pages(5)
            .with_token_path("/tmp/token.json");

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.consent_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.token_path, PathBuf::from("/tmp/token.json"));
    }
}
