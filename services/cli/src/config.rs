//! services/cli/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! Everything comes from `LEGALYZE_*` and a few plain environment variables,
//! read once before the context is built. A `.env` file in the working
//! directory is honoured outside tests.

use legalyze_core::WorkflowSettings;
use std::time::Duration;
use tracing::Level;
use url::Url;

const LOCAL_API_URL: &str = "http://localhost:8000";
const PRODUCTION_API_URL: &str = "https://legal-contract-analyzer-tjvk.onrender.com";

/// Raised when a variable is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the Analysis API is hosted when no explicit URL is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Production,
}

impl Deployment {
    pub fn default_api_url(self) -> &'static str {
        match self {
            Deployment::Local => LOCAL_API_URL,
            Deployment::Production => PRODUCTION_API_URL,
        }
    }
}

/// Client settings resolved at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: Url,
    pub deployment: Deployment,
    pub log_level: Level,
    pub poll_interval: Duration,
    pub redirect_delay: Duration,
    pub results_page: String,
    pub app_origin: String,
    pub auth_token: Option<String>,
}

impl Config {
    /// Reads the process environment, after loading `.env` when not under test.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Resolve the API location ---
        let deployment = match lookup("LEGALYZE_ENV")
            .unwrap_or_else(|| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" | "development" => Deployment::Local,
            "production" => Deployment::Production,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LEGALYZE_ENV".to_string(),
                    format!("'{}' is neither 'local' nor 'production'", other),
                ))
            }
        };
        let api_url_str = lookup("LEGALYZE_API_URL")
            .unwrap_or_else(|| deployment.default_api_url().to_string());
        let api_base_url = Url::parse(&api_url_str).map_err(|e| {
            ConfigError::InvalidValue("LEGALYZE_API_URL".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Workflow timing ---
        let poll_interval = millis(&lookup, "POLL_INTERVAL_MS", 2000)?;
        let redirect_delay = millis(&lookup, "REDIRECT_DELAY_MS", 1500)?;

        let results_page =
            lookup("RESULTS_PAGE").unwrap_or_else(|| "dashboard.html".to_string());
        let app_origin =
            lookup("APP_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let auth_token = lookup("LEGALYZE_AUTH_TOKEN").filter(|t| !t.trim().is_empty());

        Ok(Self {
            api_base_url,
            deployment,
            log_level,
            poll_interval,
            redirect_delay,
            results_page,
            app_origin,
            auth_token,
        })
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            poll_interval: self.poll_interval,
            redirect_delay: self.redirect_delay,
            results_page: self.results_page.clone(),
        }
    }
}

fn millis<F>(lookup: &F, name: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(Duration::from_millis(default)),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidValue(
                name.to_string(),
                "must be greater than zero".to_string(),
            )),
            Ok(ms) => Ok(Duration::from_millis(ms)),
            Err(e) => Err(ConfigError::InvalidValue(name.to_string(), e.to_string())),
        },
    }
}
