use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::dates::DateFormat;
use crate::models::MilestoneDeletePolicy;
use crate::telemetry::LogFormat;

/// Settings for the API client and the entity store
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without the `/api` suffix, e.g. `http://localhost:8080`
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Where tokens are persisted; in-memory only when unset
    pub token_store_path: Option<PathBuf>,
    pub milestone_delete_policy: MilestoneDeletePolicy,
}

impl ClientConfig {
    /// Load client configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            request_timeout: Duration::from_secs(
                env::var("REQUEST_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            ),
            token_store_path: env::var("TOKEN_STORE_PATH").ok().map(PathBuf::from),
            milestone_delete_policy: parse_policy()?,
        })
    }

    /// Configuration pointing at the given base URL, everything else default
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout: Duration::from_secs(30),
            token_store_path: None,
            milestone_delete_policy: MilestoneDeletePolicy::default(),
        }
    }
}

/// Settings for the reference backend
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // JWT
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub refresh_expiration_hours: i64,

    // Server
    pub host: String,
    pub port: u16,

    // Wire behaviour
    pub date_format: DateFormat,
    pub milestone_delete_policy: MilestoneDeletePolicy,

    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load server configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("JWT_EXPIRATION_HOURS"))?,
            refresh_expiration_hours: env::var("REFRESH_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("REFRESH_EXPIRATION_HOURS"))?,

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,

            date_format: env::var("SERVER_DATE_FORMAT")
                .unwrap_or_else(|_| "array".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SERVER_DATE_FORMAT"))?,
            milestone_delete_policy: parse_policy()?,

            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("LOG_FORMAT"))?,
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_policy() -> Result<MilestoneDeletePolicy, ConfigError> {
    env::var("MILESTONE_DELETE_POLICY")
        .unwrap_or_else(|_| "unlink".to_string())
        .parse()
        .map_err(|_| ConfigError::Invalid("MILESTONE_DELETE_POLICY"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
