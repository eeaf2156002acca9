use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use std::fmt;

const DEFAULT_JWT_SECRET: &str = "insecure-development-secret-change-me";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite://recipes.db`
    pub url: String,
    pub max_connections: u32,
    /// How many times to retry the initial connection before giving up
    pub connect_retries: u32,
    pub retry_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    #[serde(skip_serializing, default = "default_jwt_secret")]
    pub secret: SecretString,
    pub access_token_expiration_minutes: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for uploaded media, served under `/media`
    pub media_root: String,
}

/// Optional superuser created at startup when both fields are set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    pub email: String,
    #[serde(skip_serializing, default = "empty_secret")]
    pub password: SecretString,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            // Override with environment variables using `RECIPES__` prefix and `__` separator
            // e.g., RECIPES__DATABASE__URL="sqlite://recipes.db"
            .add_source(
                config::Environment::with_prefix("RECIPES")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl JwtConfig {
    /// True while the built-in development secret is still in use.
    pub fn uses_default_secret(&self) -> bool {
        self.secret.expose_secret() == DEFAULT_JWT_SECRET
    }
}

impl AdminConfig {
    pub fn is_configured(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.expose_secret().is_empty()
    }
}

fn default_jwt_secret() -> SecretString {
    SecretString::from(DEFAULT_JWT_SECRET.to_string())
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://recipes.db".to_string(),
            max_connections: 5,
            connect_retries: 10,
            retry_interval_ms: 1000,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            access_token_expiration_minutes: 60 * 24,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: "media".to_string(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: empty_secret(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets are skipped by their serde attributes
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Error serializing config"),
        }
    }
}
