//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream location and HTTP client settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Retry budget and backoff shape
    #[serde(default)]
    pub retry: RetryConfig,

    /// Basic-auth credentials for authorized endpoints
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Override settings from a variable lookup.
    ///
    /// Unparseable numeric values are ignored and the current value kept.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup(env::API_URL) {
            self.upstream.base_uri = uri;
        }
        if let Some(name) = lookup(env::BYPASS_HEADER_NAME) {
            self.upstream.bypass_header_name = Some(name);
        }
        if let Some(value) = lookup(env::BYPASS_HEADER_VALUE) {
            self.upstream.bypass_header_value = Some(value);
        }
        if let Some(secs) = lookup(env::TIMEOUT_SECS).and_then(|v| v.parse().ok()) {
            self.upstream.timeout_secs = secs;
        }
        if let Some(n) = lookup(env::MAX_ATTEMPTS).and_then(|v| v.parse().ok()) {
            self.retry.max_attempts = n;
        }
        if let (Some(username), Some(password)) = (lookup(env::USERNAME), lookup(env::PASSWORD)) {
            self.credentials = Some(CredentialsConfig { username, password });
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.upstream.base_uri).map_err(|e| {
            AppError::validation(format!(
                "upstream.base_uri '{}' is not a valid URI: {e}",
                self.upstream.base_uri
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation("upstream.base_uri must be http(s)"));
        }
        if self.upstream.user_agent.trim().is_empty() {
            return Err(AppError::validation("upstream.user_agent is empty"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(AppError::validation("upstream.timeout_secs must be > 0"));
        }
        if self.upstream.bypass_header_name.is_some() != self.upstream.bypass_header_value.is_some()
        {
            return Err(AppError::validation(
                "upstream.bypass_header_name and bypass_header_value must be set together",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be >= 1"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(AppError::validation("retry.multiplier must be >= 1.0"));
        }
        if !(0.0..=1.0).contains(&self.retry.randomization_factor) {
            return Err(AppError::validation(
                "retry.randomization_factor must be within [0, 1]",
            ));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(AppError::validation(
                "retry.max_delay_ms must be >= retry.initial_delay_ms",
            ));
        }
        Ok(())
    }
}

/// Environment variable names read by [`Config::apply_env`].
pub mod env {
    pub const API_URL: &str = "CRISTIN_API_URL";
    pub const BYPASS_HEADER_NAME: &str = "CRISTIN_BOT_FILTER_BYPASS_HEADER_NAME";
    pub const BYPASS_HEADER_VALUE: &str = "CRISTIN_BOT_FILTER_BYPASS_HEADER_VALUE";
    pub const TIMEOUT_SECS: &str = "CRISTIN_TIMEOUT_SECS";
    pub const MAX_ATTEMPTS: &str = "CRISTIN_RETRY_MAX_ATTEMPTS";
    pub const USERNAME: &str = "CRISTIN_USERNAME";
    pub const PASSWORD: &str = "CRISTIN_PASSWORD";
}

/// Upstream location and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URI of the upstream API, including the version segment
    #[serde(default = "defaults::base_uri")]
    pub base_uri: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Header that lets trusted callers past the upstream bot filter
    #[serde(default)]
    pub bypass_header_name: Option<String>,

    #[serde(default)]
    pub bypass_header_value: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_uri: defaults::base_uri(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            bypass_header_name: None,
            bypass_header_value: None,
        }
    }
}

/// Retry budget and backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, the first one included
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt in milliseconds
    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_ms: u64,

    /// Growth factor applied per further attempt
    #[serde(default = "defaults::multiplier")]
    pub multiplier: f64,

    /// Relative jitter applied to each delay (0 disables jitter)
    #[serde(default = "defaults::randomization_factor")]
    pub randomization_factor: f64,

    /// Upper bound for a single delay in milliseconds
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_delay_ms: defaults::initial_delay(),
            multiplier: defaults::multiplier(),
            randomization_factor: defaults::randomization_factor(),
            max_delay_ms: defaults::max_delay(),
        }
    }
}

/// Basic-auth credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

mod defaults {
    // Upstream defaults
    pub fn base_uri() -> String {
        "https://api.cristin.no/v2".into()
    }
    pub fn user_agent() -> String {
        concat!("cristin-gateway/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        15
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn initial_delay() -> u64 {
        100
    }
    pub fn multiplier() -> f64 {
        1.5
    }
    pub fn randomization_factor() -> f64 {
        0.5
    }
    pub fn max_delay() -> u64 {
        2_000
    }
}
