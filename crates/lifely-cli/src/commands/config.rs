//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", config_path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    check(config)?;
    if config.google_settings().has_credentials() {
        println!("Google credentials are valid.");
    }
    println!("Configuration is valid.");
    Ok(())
}

fn check(config: &ClientConfig) -> ClientResult<()> {
    config.wrapped.timezone().map_err(ClientError::Config)?;

    if config.wrapped.top == 0 {
        return Err(ClientError::Config("wrapped.top must be at least 1".to_string()));
    }

    let google = config.google_settings();
    google.to_google_config().map_err(ClientError::Config)?;
    if google.has_credentials() {
        let credentials = google
            .resolve_credentials()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
        credentials
            .validate()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
    }
    Ok(())
}

/// Show the configuration, data and token paths.
pub fn path(config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    println!("config: {}", config_path.display());
    println!("data:   {}", config.wrapped.data_dir().display());
    let token_path = config
        .google_settings()
        .to_google_config()
        .map(|c| c.token_path)
        .map_err(ClientError::Config)?;
    println!("tokens: {}", token_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleSettings;

    #[test]
    fn default_config_is_valid() {
        assert!(check(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let mut config = ClientConfig::default();
        config.wrapped.timezone = "Nowhere/Special".to_string();
        assert!(matches!(check(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn zero_top_is_rejected() {
        let mut config = ClientConfig::default();
        config.wrapped.top = 0;
        assert!(check(&config).is_err());
    }

    #[test]
    fn malformed_client_id_is_rejected() {
        let config = ClientConfig {
            google: Some(GoogleSettings {
                client_id: Some("not-a-google-id".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("apps.googleusercontent.com"));
    }
}
