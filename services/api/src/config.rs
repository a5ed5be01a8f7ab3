//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent, state is kept in files under `data_dir`.
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub classifier_model: String,
    pub firebase_api_key: Option<String>,
    pub identity_base_url: String,
    pub mock_delay: Duration,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Server and Storage Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL");
        let data_dir = var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Classifier Settings (the key is optional; without it the mock is used) ---
        let openai_api_key = var("OPENAI_API_KEY");
        let openai_api_base = var("OPENAI_API_BASE");
        let classifier_model = var("CLASSIFIER_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let mock_delay = match var("MOCK_DELAY_MS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|e| {
                ConfigError::InvalidValue("MOCK_DELAY_MS".to_string(), e.to_string())
            })?,
            None => authenticity_core::mock::DEFAULT_MOCK_DELAY,
        };

        // --- Identity Provider Settings ---
        let firebase_api_key = var("FIREBASE_API_KEY");
        let identity_base_url =
            var("IDENTITY_BASE_URL").unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string());

        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8081".to_string());

        Ok(Self {
            bind_address,
            database_url,
            data_dir,
            log_level,
            openai_api_key,
            openai_api_base,
            classifier_model,
            firebase_api_key,
            identity_base_url,
            mock_delay,
            cors_origin,
        })
    }

    /// The identity API key, which the server cannot run without.
    pub fn require_firebase_api_key(&self) -> Result<&str, ConfigError> {
        self.firebase_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("FIREBASE_API_KEY".to_string()))
    }
}
