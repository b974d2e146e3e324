// src/config.rs

//! Configuration loading utilities.
//!
//! Resolves the effective [`Config`] from an optional TOML file and the
//! process environment, and derives the per-request decorations from it.

use std::path::Path;

use crate::error::Result;
use crate::models::{BypassHeader, Config, Credentials, UpstreamConfig};

/// Load configuration from an optional TOML file, then apply environment
/// overrides and validate the result.
///
/// Without a path the defaults are used. A path that cannot be read or
/// parsed is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let config = Config::load(path)?;
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

/// Bot-filter bypass header, when both name and value are configured.
pub fn bypass_header(config: &UpstreamConfig) -> Option<BypassHeader> {
    match (&config.bypass_header_name, &config.bypass_header_value) {
        (Some(name), Some(value)) => Some(BypassHeader::new(name, value)),
        _ => None,
    }
}

/// Basic-auth credentials for authorized endpoints, if configured.
pub fn credentials(config: &Config) -> Option<Credentials> {
    config.credentials.as_ref().map(Credentials::from)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::AppError;
    use crate::models::CredentialsConfig;

    #[test]
    fn invalid_file_values_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\ntimeout_secs = 0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream\nbase_uri = ").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, AppError::Toml(_)));
    }

    #[test]
    fn bypass_header_needs_both_parts() {
        let mut upstream = UpstreamConfig::default();
        assert!(bypass_header(&upstream).is_none());

        upstream.bypass_header_name = Some("X-Bypass".into());
        assert!(bypass_header(&upstream).is_none());

        upstream.bypass_header_value = Some("token".into());
        assert_eq!(
            bypass_header(&upstream),
            Some(BypassHeader::new("X-Bypass", "token"))
        );
    }

    #[test]
    fn credentials_follow_config() {
        let mut config = Config::default();
        assert!(credentials(&config).is_none());

        config.credentials = Some(CredentialsConfig {
            username: "nva".into(),
            password: "secret".into(),
        });
        let credentials = credentials(&config).unwrap();
        assert_eq!(credentials.username, "nva");
        assert_eq!(credentials.password, "secret");
    }
}
