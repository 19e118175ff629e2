//! Backend connection configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Connection settings for the hosted backend project.
///
/// Loaded from a TOML file; `ARENA_BACKEND_URL` and `ARENA_API_KEY`
/// environment variables override the file values, so credentials can
/// stay out of checked-in config.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://myproject.example.co`.
    base_url: String,

    /// Publishable (anon) API key for the project.
    api_key: String,
}

impl BackendConfig {
    /// Creates a configuration from explicit values.
    #[instrument(skip(api_key))]
    pub fn new(base_url: String, api_key: String) -> Self {
        Self { base_url, api_key }
    }

    /// Loads configuration from a TOML file, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or
    /// if a required field ends up empty.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;
        info!(base_url = %config.base_url, "Config loaded successfully");
        Ok(config)
    }

    /// Builds configuration from environment variables alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either variable is unset or empty.
    #[instrument]
    pub fn from_env() -> Result<Self, ConfigError> {
        debug!("Loading config from environment");
        let mut config = Self {
            base_url: String::new(),
            api_key: String::new(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ARENA_BACKEND_URL") {
            debug!("ARENA_BACKEND_URL override in effect");
            self.base_url = url;
        }
        if let Ok(key) = std::env::var("ARENA_API_KEY") {
            debug!("ARENA_API_KEY override in effect");
            self.api_key = key;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::new(
                "base_url is not set (config file or ARENA_BACKEND_URL)".to_string(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::new(
                "api_key is not set (config file or ARENA_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BackendConfig;
    use std::io::Write;

    #[test]
    fn loads_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"https://proj.example.co\"\napi_key = \"anon-key\""
        )
        .unwrap();

        let config = BackendConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url(), "https://proj.example.co");
        assert_eq!(config.api_key(), "anon-key");
    }

    #[test]
    fn rejects_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"https://proj.example.co\"").unwrap();

        assert!(BackendConfig::from_file(file.path()).is_err());
    }
}
