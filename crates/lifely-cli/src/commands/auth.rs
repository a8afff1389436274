//! Authentication command.

use std::path::{Path, PathBuf};

use lifely_google::{GoogleSession, IdentityClient, OAuthCredentials};
use tracing::{info, warn};

use crate::cli::AuthArgs;
use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Runs the Google consent flow.
///
/// Resolves credentials from CLI flags, a `--credentials-file`, or
/// `config.toml`, then runs the OAuth 2.0 PKCE flow. Credentials given on
/// the command line are persisted to `config_path` so later commands can
/// refresh the token.
pub async fn run(args: AuthArgs, config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    let (credentials, source) = resolve_google_credentials(
        args.client_id,
        args.client_secret,
        args.credentials_file,
        config.google.as_ref(),
    )?;
    credentials
        .validate()
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

    let google_config = config
        .google_settings()
        .to_google_config()
        .map_err(ClientError::Config)?;
    let session = GoogleSession::new(IdentityClient::new(google_config)?, credentials.clone());

    if !args.force && session.has_usable_tokens()? {
        save_credentials_to_config(config_path, &credentials, &source);
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to re-authenticate.");
        return Ok(());
    }

    println!("Starting Google Calendar authentication...");
    println!();
    println!("A browser window will open for you to authorize read-only access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    session.authenticate(args.force).await?;
    save_credentials_to_config(config_path, &credentials, &source);

    info!("Google authentication successful");
    println!();
    println!("Authentication successful!");
    println!("Tokens saved to {}", session.storage().path().display());
    println!();
    println!("Run 'lifely wrapped' to see your year.");

    Ok(())
}

/// Where the credentials were resolved from.
#[derive(Debug, PartialEq)]
enum CredentialSource {
    /// From CLI flags (--client-id or --credentials-file)
    Cli,
    /// From config.toml (already persisted)
    Config,
}

/// Writes credentials into the `[google]` table of the config file.
///
/// Only credentials from a transient source are written. Other keys and
/// comments in the file are preserved.
fn save_credentials_to_config(
    config_path: &Path,
    credentials: &OAuthCredentials,
    source: &CredentialSource,
) {
    if *source == CredentialSource::Config {
        return;
    }

    let content = if config_path.exists() {
        std::fs::read_to_string(config_path).unwrap_or_default()
    } else {
        String::new()
    };

    let mut doc = match content.parse::<toml_edit::DocumentMut>() {
        Ok(d) => d,
        Err(e) => {
            warn!("could not parse {} for writing: {}", config_path.display(), e);
            return;
        }
    };

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    if let Some(google) = doc["google"].as_table_mut() {
        google["client_id"] = toml_edit::value(credentials.client_id.as_str());
        match credentials.client_secret {
            Some(ref secret) => google["client_secret"] = toml_edit::value(secret.as_str()),
            None => {
                google.remove("client_secret");
            }
        }
    }

    if let Some(parent) = config_path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!("could not create config directory {}: {}", parent.display(), e);
        return;
    }

    match std::fs::write(config_path, doc.to_string()) {
        Ok(()) => {
            info!("credentials saved to {}", config_path.display());
            println!("Credentials saved to {}", config_path.display());
        }
        Err(e) => warn!("could not save credentials to {}: {}", config_path.display(), e),
    }
}

/// Resolves Google credentials from multiple sources.
///
/// Priority (highest to lowest):
/// 1. CLI `--client-id` (with optional `--client-secret`)
/// 2. CLI `--credentials-file` (Google Cloud Console JSON)
/// 3. `config.toml` `[google]` section, with secret resolution
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    config_google: Option<&GoogleSettings>,
) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    if let Some(id) = cli_client_id {
        return Ok((OAuthCredentials::new(id, cli_client_secret), CredentialSource::Cli));
    }

    if cli_client_secret.is_some() {
        return Err(ClientError::Config(
            "--client-secret needs a matching --client-id".to_string(),
        ));
    }

    if let Some(ref path) = cli_credentials_file {
        let creds = OAuthCredentials::from_file(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e
            ))
        })?;
        return Ok((creds, CredentialSource::Cli));
    }

    if let Some(google) = config_google
        && google.has_credentials()
    {
        let creds = google.resolve_credentials().map_err(|e| {
            ClientError::Config(format!(
                "failed to resolve Google credentials from config: {}",
                e
            ))
        })?;
        return Ok((creds, CredentialSource::Config));
    }

    Err(ClientError::Config(format!(
        "Google credentials are required. Provide via:\n  \
         - client_id (and client_secret) in {}\n  \
         - --client-id and --client-secret flags\n  \
         - --credentials-file flag (path to Google Cloud Console JSON)\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        ClientConfig::default_path().display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_credentials_from_cli() {
        let (creds, source) = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(creds.client_id, "cli-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("cli-secret"));
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn resolve_credentials_cli_id_only() {
        let (creds, source) = resolve_google_credentials(
            Some("public-id.apps.googleusercontent.com".to_string()),
            None,
            None,
            None,
        )
        .unwrap();
        assert!(creds.client_secret.is_none());
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn resolve_credentials_from_config() {
        let settings = GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        };
        let (creds, source) = resolve_google_credentials(None, None, None, Some(&settings)).unwrap();
        assert_eq!(creds.client_id, "config-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("config-secret"));
        assert_eq!(source, CredentialSource::Config);
    }

    #[test]
    fn resolve_credentials_cli_overrides_config() {
        let settings = GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        };
        let (creds, source) = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            Some(&settings),
        )
        .unwrap();
        assert_eq!(creds.client_id, "cli-id.apps.googleusercontent.com");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn resolve_credentials_secret_without_id_fails() {
        let result = resolve_google_credentials(None, Some("secret".to_string()), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_credentials_no_credentials_fails() {
        let result = resolve_google_credentials(None, None, None, None);
        assert!(result.is_err());

        let empty = GoogleSettings::default();
        let result = resolve_google_credentials(None, None, None, Some(&empty));
        assert!(result.is_err());
    }

    #[test]
    fn resolve_credentials_from_cli_credentials_file() {
        let tmp = tempfile::tempdir().unwrap();
        let creds_path = tmp.path().join("creds.json");
        std::fs::write(
            &creds_path,
            r#"{
                "installed": {
                    "client_id": "file-id.apps.googleusercontent.com",
                    "client_secret": "file-secret"
                }
            }"#,
        )
        .unwrap();

        let (creds, source) = resolve_google_credentials(None, None, Some(creds_path), None).unwrap();
        assert_eq!(creds.client_id, "file-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("file-secret"));
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn save_credentials_skips_when_source_is_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        let creds = OAuthCredentials::new("id", Some("secret".to_string()));
        save_credentials_to_config(&config_path, &creds, &CredentialSource::Config);
        assert!(!config_path.exists());
    }

    #[test]
    fn save_credentials_preserves_existing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            "# my settings\n[wrapped]\ntop = 3\n\n[google]\nclient_secret = \"stale\"\n",
        )
        .unwrap();

        let creds = OAuthCredentials::new("test.apps.googleusercontent.com", None);
        save_credentials_to_config(&config_path, &creds, &CredentialSource::Cli);

        let written = std::fs::read_to_string(&config_path).unwrap();
        assert!(written.contains("# my settings"));

        let reloaded: ClientConfig = toml::from_str(&written).unwrap();
        let google = reloaded.google.unwrap();
        assert_eq!(
            google.client_id.as_deref(),
            Some("test.apps.googleusercontent.com")
        );
        assert!(google.client_secret.is_none());
        assert_eq!(reloaded.wrapped.top, 3);
    }

    #[test]
    fn save_credentials_creates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("nested").join("config.toml");
        let creds = OAuthCredentials::new("new.apps.googleusercontent.com", Some("s".to_string()));
        save_credentials_to_config(&config_path, &creds, &CredentialSource::Cli);

        let reloaded = ClientConfig::load_from(&config_path).unwrap();
        let google = reloaded.google.unwrap();
        assert_eq!(google.client_secret.as_deref(), Some("s"));
    }
}
