//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/lifely/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) may be secret
//! references (`pass::`, `env::`, `file::`), see [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use lifely_google::{GoogleConfig, OAuthCredentials};
use serde::{Deserialize, Serialize};

/// Configuration for the lifely client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google settings.
    pub google: Option<GoogleSettings>,

    /// Debug mode.
    pub debug: bool,

    /// Year summary settings.
    pub wrapped: WrappedSettings,

    /// Display settings.
    pub display: DisplaySettings,
}

/// Settings for the year summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WrappedSettings {
    /// IANA time zone events are converted into.
    pub timezone: String,

    /// Number of people to show.
    pub top: usize,

    /// Minimum shared events for a person to be listed.
    pub min_events: usize,

    /// Where raw event caches and stats are written.
    pub data_dir: Option<PathBuf>,
}

impl Default for WrappedSettings {
    fn default() -> Self {
        Self {
            timezone: lifely_core::DEFAULT_TIMEZONE.name().to_string(),
            top: 10,
            min_events: 1,
            data_dir: None,
        }
    }
}

impl WrappedSettings {
    /// Parses the configured time zone.
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("invalid timezone {:?}: {}", self.timezone, e))
    }

    /// The data directory, falling back to the platform default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(ClientConfig::default_data_dir)
    }
}

/// Display settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Skip count-up and typewriter animations.
    pub reduced_motion: bool,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lifely")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lifely")
    }

    /// Google settings, or defaults when the section is absent.
    pub fn google_settings(&self) -> GoogleSettings {
        self.google.clone().unwrap_or_default()
    }
}

/// Google settings.
///
/// Credentials (`client_id`, `client_secret`) are stored inline and support
/// secret references (`pass::…`, `env::…`, `file::…`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Path to token storage.
    pub token_path: Option<PathBuf>,

    /// Page ceiling for event fetches.
    pub max_pages: Option<usize>,

    /// Seconds to wait on the consent page before giving up.
    pub consent_timeout_secs: Option<u64>,
}

impl GoogleSettings {
    /// Builds the Google client configuration (no credentials needed).
    pub fn to_google_config(&self) -> Result<GoogleConfig, String> {
        let mut config = GoogleConfig::new();

        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if let Some(max_pages) = self.max_pages {
            config = config.with_max_pages(max_pages);
        }
        if let Some(secs) = self.consent_timeout_secs {
            config = config.with_consent_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns true when a client ID is configured.
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some()
    }

    /// Resolves Google OAuth credentials from inline fields.
    ///
    /// `client_id` is required, `client_secret` optional. Each value is passed
    /// through `secret::resolve()` to expand references.
    pub fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n\n  \
                 Or run: lifely auth --credentials-file <path>",
                ClientConfig::default_path().display()
            )
        })?;

        let client_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .map(crate::secret::resolve)
            .transpose()
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(client_id, client_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert!(config.google.is_none());
        assert_eq!(config.wrapped.top, 10);
        assert_eq!(config.wrapped.timezone, "America/New_York");
        assert_eq!(config.wrapped.timezone().unwrap(), chrono_tz::America::New_York);
        assert!(!config.display.reduced_motion);
    }

    #[test]
    fn resolve_credentials_plain_text() {
        let settings = GoogleSettings {
            client_id: Some("test-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("test-secret".to_string()),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("test-secret"));
    }

    #[test]
    fn resolve_credentials_without_secret() {
        let settings = GoogleSettings {
            client_id: Some("id.apps.googleusercontent.com".to_string()),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert!(creds.client_secret.is_none());
    }

    #[test]
    fn resolve_credentials_env_prefix() {
        unsafe {
            std::env::set_var("_LIFELY_TEST_CLIENT_ID", "env-id.apps.googleusercontent.com");
            std::env::set_var("_LIFELY_TEST_CLIENT_SECRET", "env-secret");
        }

        let settings = GoogleSettings {
            client_id: Some("env::_LIFELY_TEST_CLIENT_ID".to_string()),
            client_secret: Some("env::_LIFELY_TEST_CLIENT_SECRET".to_string()),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "env-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("env-secret"));

        unsafe {
            std::env::remove_var("_LIFELY_TEST_CLIENT_ID");
            std::env::remove_var("_LIFELY_TEST_CLIENT_SECRET");
        }
    }

    #[test]
    fn resolve_credentials_missing_id_errors() {
        let settings = GoogleSettings {
            client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        let err = settings.resolve_credentials().unwrap_err();
        assert!(err.contains("credentials not found"));
    }

    #[test]
    fn resolve_credentials_unresolvable_secret_errors() {
        let settings = GoogleSettings {
            client_id: Some("id.apps.googleusercontent.com".to_string()),
            client_secret: Some("env::_LIFELY_TEST_UNSET_SECRET_98765".to_string()),
            ..Default::default()
        };
        let err = settings.resolve_credentials().unwrap_err();
        assert!(err.contains("client_secret"));
    }

    #[test]
    fn google_config_from_settings() {
        let settings = GoogleSettings {
            token_path: Some(PathBuf::from("/tmp/lifely-token.json")),
            max_pages: Some(7),
            consent_timeout_secs: Some(90),
            ..Default::default()
        };
        let config = settings.to_google_config().unwrap();
        assert_eq!(config.token_path, PathBuf::from("/tmp/lifely-token.json"));
        assert_eq!(config.max_pages, 7);
        assert_eq!(config.consent_timeout, Some(Duration::from_secs(90)));

        let bad = GoogleSettings {
            max_pages: Some(0),
            ..Default::default()
        };
        assert!(bad.to_google_config().is_err());
    }

    #[test]
    fn config_toml_full() {
        let toml_content = r#"
debug = true

[google]
client_id = "toml-id.apps.googleusercontent.com"
client_secret = "toml-secret"
max_pages = 20

[wrapped]
timezone = "Europe/Paris"
top = 5
data_dir = "/tmp/lifely-data"

[display]
reduced_motion = true
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert!(config.debug);
        assert!(config.display.reduced_motion);
        assert_eq!(config.wrapped.top, 5);
        assert_eq!(config.wrapped.min_events, 1);
        assert_eq!(config.wrapped.timezone().unwrap(), chrono_tz::Europe::Paris);
        assert_eq!(config.wrapped.data_dir(), PathBuf::from("/tmp/lifely-data"));

        let google = config.google.unwrap();
        assert_eq!(google.max_pages, Some(20));
        let creds = google.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "toml-id.apps.googleusercontent.com");
    }

    #[test]
    fn invalid_timezone() {
        let config: ClientConfig = toml::from_str("[wrapped]\ntimezone = \"Mars/Olympus\"\n").unwrap();
        assert!(config.wrapped.timezone().unwrap_err().contains("Mars/Olympus"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[google]\nclient_id = \"x.apps.googleusercontent.com\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert!(config.google_settings().has_credentials());

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(ClientConfig::load_from(&path).unwrap_err().contains("parse"));
    }
}
