// Centralized configuration management for the ProdShot backend
// Load ALL env vars ONCE at startup, fail fast on anything missing

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    // For tests, load .env file first
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Accessor used by modules that want a non-static reference
pub fn config() -> &'static AppConfig {
    &CONFIG
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: u64,
    pub database_idle_timeout: u64,
    pub database_max_lifetime: u64,

    // Redis
    pub redis_url: String,
    pub redis_pool_size: u32,
    pub redis_connection_timeout: u64,
    pub redis_retry_attempts: u32,
    pub redis_retry_delay_ms: u64,

    // JWT
    pub jwt_access_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,

    // CORS
    pub cors_allowed_origins: Vec<String>,

    // Nested sections
    pub openai: OpenAiConfig,
    pub scrape: ScrapeConfig,
    pub share: ShareConfig,
    pub features: FeatureConfig,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// OpenAI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_url: String,
    pub completion_model: String,
    pub image_model: String,
    pub request_timeout: u64,
}

/// Scraping API configuration (Firecrawl-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub api_key: String,
    pub api_url: String,
    pub request_timeout: u64,
    pub wait_for_ms: u32,
}

/// Share link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Public base URL for showcase pages, e.g. https://prodshot.io/s
    pub base_url: String,
    /// Default expiry for new share links, in days
    pub default_expiry_days: i64,
}

/// Feature flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub enforce_usage_limits: bool,
    pub enable_swagger_ui: bool,
    pub disable_embedded_migrations: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: get_env_or("BIND_ADDRESS", "0.0.0.0"),
            port: parse_env_or("PORT", 8080)?,
            environment: Environment::from(get_env_or("ENVIRONMENT", "development")),

            database_url: get_env("DATABASE_URL")?,
            database_max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", 20)?,
            database_min_connections: parse_env_or("DATABASE_MIN_CONNECTIONS", 2)?,
            database_connect_timeout: parse_env_or("DATABASE_CONNECT_TIMEOUT", 10)?,
            database_idle_timeout: parse_env_or("DATABASE_IDLE_TIMEOUT", 600)?,
            database_max_lifetime: parse_env_or("DATABASE_MAX_LIFETIME", 1800)?,

            redis_url: get_env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            redis_pool_size: parse_env_or("REDIS_POOL_SIZE", 10)?,
            redis_connection_timeout: parse_env_or("REDIS_CONNECTION_TIMEOUT", 5)?,
            redis_retry_attempts: parse_env_or("REDIS_RETRY_ATTEMPTS", 3)?,
            redis_retry_delay_ms: parse_env_or("REDIS_RETRY_DELAY_MS", 100)?,

            jwt_access_secret: get_env("JWT_ACCESS_SECRET")?,
            jwt_audience: get_env_or("JWT_AUDIENCE", "prodshot.io"),
            jwt_issuer: get_env_or("JWT_ISSUER", "prodshot-backend"),

            cors_allowed_origins: get_env_or("CORS_ALLOWED_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            openai: OpenAiConfig {
                api_key: get_env("OPENAI_API_KEY")?,
                api_url: get_env_or("OPENAI_API_URL", "https://api.openai.com/v1"),
                completion_model: get_env_or("OPENAI_COMPLETION_MODEL", "gpt-4o"),
                image_model: get_env_or("OPENAI_IMAGE_MODEL", "dall-e-3"),
                request_timeout: parse_env_or("OPENAI_REQUEST_TIMEOUT", 120)?,
            },

            scrape: ScrapeConfig {
                api_key: get_env("FIRECRAWL_API_KEY")?,
                api_url: get_env_or("FIRECRAWL_API_URL", "https://api.firecrawl.dev/v2"),
                request_timeout: parse_env_or("FIRECRAWL_REQUEST_TIMEOUT", 60)?,
                wait_for_ms: parse_env_or("FIRECRAWL_WAIT_FOR_MS", 3000)?,
            },

            share: ShareConfig {
                base_url: get_env_or("SHARE_BASE_URL", "https://prodshot.io/s"),
                default_expiry_days: parse_env_or("SHARE_DEFAULT_EXPIRY_DAYS", 30)?,
            },

            features: FeatureConfig {
                enforce_usage_limits: parse_bool_or("ENFORCE_USAGE_LIMITS", true),
                enable_swagger_ui: parse_bool_or("ENABLE_SWAGGER_UI", true),
                disable_embedded_migrations: parse_bool_or("DISABLE_EMBEDDED_MIGRATIONS", false),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

// =============================================================================
// ENV HELPERS
// =============================================================================

fn get_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), val)),
        Err(_) => Ok(default),
    }
}

fn parse_bool_or(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from("production".to_string()),
            Environment::Production
        );
        assert_eq!(Environment::from("prod".to_string()), Environment::Production);
        assert_eq!(Environment::from("TEST".to_string()), Environment::Test);
        assert_eq!(
            Environment::from("anything-else".to_string()),
            Environment::Development
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Staging.to_string(), "staging");
        assert_eq!(Environment::Development.to_string(), "development");
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_bool_or() {
        std::env::set_var("TEST_BOOL_FLAG", "yes");
        assert!(parse_bool_or("TEST_BOOL_FLAG", false));
        std::env::set_var("TEST_BOOL_FLAG", "0");
        assert!(!parse_bool_or("TEST_BOOL_FLAG", true));
        std::env::remove_var("TEST_BOOL_FLAG");
        assert!(parse_bool_or("TEST_BOOL_FLAG", true));
    }
}
