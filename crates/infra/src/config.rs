//! Environment-driven application configuration.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub use eduhub_observability::LogFormat;

pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_DEMO_DATA_ENV: &str = "SEED_DEMO_DATA";
pub const AUTO_PUBLISH_ON_CREATE_ENV: &str = "AUTO_PUBLISH_ON_CREATE";
pub const ENROLLMENT_MAX_ATTEMPTS_ENV: &str = "ENROLLMENT_MAX_ATTEMPTS";
pub const DEFAULT_PAGE_SIZE_ENV: &str = "DEFAULT_PAGE_SIZE";
pub const MAX_PAGE_SIZE_ENV: &str = "MAX_PAGE_SIZE";

const DEV_JWT_SECRET: &str = "dev-secret";

/// Source of configuration values.
///
/// Lets tests supply values without mutating the process environment.
pub trait ConfigEnv {
    fn string(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl ConfigEnv for ProcessEnv {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub log_format: LogFormat,
    pub seed_demo_data: bool,
    /// Default `isPublished` for new courses when the request omits it.
    pub auto_publish_on_create: bool,
    /// Attempts per storage write before a conflict is reported (>= 1).
    pub enrollment_max_attempts: u32,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            log_format: LogFormat::Json,
            seed_demo_data: false,
            auto_publish_on_create: true,
            enrollment_max_attempts: 3,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(&ProcessEnv)
    }

    /// Load configuration from a custom environment source.
    pub fn from_env_with(env: &impl ConfigEnv) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = match env.string(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let config = Self {
            bind_addr: parsed(env, BIND_ADDR_ENV)?.unwrap_or(defaults.bind_addr),
            jwt_secret,
            log_format: parsed(env, LOG_FORMAT_ENV)?.unwrap_or(defaults.log_format),
            seed_demo_data: flag(env, SEED_DEMO_DATA_ENV)?.unwrap_or(defaults.seed_demo_data),
            auto_publish_on_create: flag(env, AUTO_PUBLISH_ON_CREATE_ENV)?
                .unwrap_or(defaults.auto_publish_on_create),
            enrollment_max_attempts: parsed(env, ENROLLMENT_MAX_ATTEMPTS_ENV)?
                .unwrap_or(defaults.enrollment_max_attempts),
            default_page_size: parsed(env, DEFAULT_PAGE_SIZE_ENV)?
                .unwrap_or(defaults.default_page_size),
            max_page_size: parsed(env, MAX_PAGE_SIZE_ENV)?.unwrap_or(defaults.max_page_size),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.enrollment_max_attempts == 0 {
            return Err(invalid(ENROLLMENT_MAX_ATTEMPTS_ENV, "0", "must be at least 1"));
        }
        if self.max_page_size == 0 {
            return Err(invalid(MAX_PAGE_SIZE_ENV, "0", "must be at least 1"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(invalid(
                DEFAULT_PAGE_SIZE_ENV,
                &self.default_page_size.to_string(),
                "must be between 1 and MAX_PAGE_SIZE",
            ));
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parsed<T>(env: &impl ConfigEnv, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.string(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(name, &raw, &e.to_string())),
    }
}

fn flag(env: &impl ConfigEnv, name: &'static str) -> Result<Option<bool>, ConfigError> {
    match env.string(name) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(invalid(name, &raw, "expected a boolean")),
        },
    }
}
