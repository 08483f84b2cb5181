//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! Configuration is built once at startup and passed to whoever needs it; any missing
//! or malformed required variable stops the process before it serves anything.

use std::env;
use std::str::FromStr;

use validator::ValidateUrl;

use crate::{
    constants::{
        DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_LOG_FILTER, DEFAULT_SERVER_HOST,
        DEFAULT_SERVER_PORT,
    },
    validation::PasswordPolicy,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub site: SiteConfig,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

/// Redis configuration; without a URL the listing cache stays in memory
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// Session token and password configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign session tokens
    pub secret: String,
    pub password_policy: PasswordPolicy,
}

/// Public site configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Canonical URL of the site
    pub url: String,
    pub telemetry_disabled: bool,
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        Ok(Self {
            environment: vars.parsed("APP_ENV")?,
            server: ServerConfig::from_vars(&vars)?,
            database: DatabaseConfig::from_vars(&vars)?,
            redis: RedisConfig {
                url: vars.optional("REDIS_URL"),
            },
            auth: AuthConfig::from_vars(&vars)?,
            site: SiteConfig::from_vars(&vars)?,
        })
    }
}

impl ServerConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: vars
                .optional("SERVER_HOST")
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: vars.parsed_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: vars
                .optional("RUST_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

impl DatabaseConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let port: u16 = vars.parsed("DB_PORT")?;
        if port == 0 {
            return Err(ConfigError::InvalidValue("DB_PORT".to_string()));
        }

        Ok(Self {
            url: vars.required("DATABASE_URL")?,
            host: vars.required("DB_HOST")?,
            port,
            name: vars.non_empty("DB_DATABASE_NAME")?,
            username: vars.non_empty("DB_USERNAME")?,
            password: vars.non_empty("DB_PASSWORD")?,
            max_connections: vars
                .parsed_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl AuthConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: vars.required("AUTH_SECRET")?,
            password_policy: vars.parsed_or("PASSWORD_POLICY", PasswordPolicy::default())?,
        })
    }
}

impl SiteConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let url = vars.required("SITE_URL")?;
        if !url.validate_url() {
            return Err(ConfigError::InvalidValue("SITE_URL".to_string()));
        }

        if vars.required("TELEMETRY_DISABLED")? != "1" {
            return Err(ConfigError::InvalidValue("TELEMETRY_DISABLED".to_string()));
        }

        Ok(Self {
            url,
            telemetry_disabled: true,
        })
    }
}

/// Variable lookup with the parsing rules shared by every section
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn non_empty(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.required(key)?.trim().to_string();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue(key.to_string()));
        }
        Ok(value)
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<T, ConfigError> {
        self.required(key)?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string()))
    }

    fn parsed_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string())),
            None => Ok(default),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
