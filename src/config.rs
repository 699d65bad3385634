//! Gate configuration loaded from environment variables.
//!
//! Values are optional at load time. A missing `DATABASE_URL` or secret is a
//! configuration defect that the `environment` and `jwt-secrets` probes
//! report, so loading only fails on malformed values.

use std::time::Duration;

use thiserror::Error;

use crate::startup::DEFAULT_PROBE_TIMEOUT;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_REFRESH_SECRET_ENV: &str = "JWT_REFRESH_SECRET";
pub const S3_ENDPOINT_ENV: &str = "S3_ENDPOINT";
pub const S3_BUCKET_ENV: &str = "S3_BUCKET_NAME";
pub const LLM_BASE_URL_ENV: &str = "LLM_API_BASE_URL";
pub const LLM_API_KEY_ENV: &str = "LLM_API_KEY";
pub const REQUIRED_ENV_ENV: &str = "DEPGATE_REQUIRED_ENV";
pub const STORAGE_CRITICAL_ENV: &str = "DEPGATE_STORAGE_CRITICAL";
pub const LLM_CRITICAL_ENV: &str = "DEPGATE_LLM_CRITICAL";
pub const DEFAULT_TIMEOUT_ENV: &str = "DEPGATE_DEFAULT_TIMEOUT_MS";
pub const USER_AGENT_ENV: &str = "DEPGATE_USER_AGENT";

pub const DEFAULT_S3_ENDPOINT: &str = "https://s3.amazonaws.com";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// User-Agent sent by the HTTP probes unless overridden
pub fn default_user_agent() -> String {
    format!("depgate/{}", env!("CARGO_PKG_VERSION"))
}

/// Keys the `environment` probe requires unless overridden
pub const DEFAULT_REQUIRED_ENV: &[&str] =
    &[DATABASE_URL_ENV, JWT_SECRET_ENV, JWT_REFRESH_SECRET_ENV];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a whole number of milliseconds, got '{value}'")]
    InvalidTimeout { key: String, value: String },

    #[error("{key} must be greater than zero")]
    ZeroTimeout { key: String },

    #[error("{key} must be a boolean (1/0, true/false, yes/no, on/off), got '{value}'")]
    InvalidBool { key: String, value: String },
}

/// A key the `environment` probe must find non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredVar {
    pub key: String,
    /// Raw value as read, blank values included
    pub value: Option<String>,
}

impl RequiredVar {
    pub fn is_present(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: Option<String>,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub critical: bool,
}

/// Everything the standard probe set closes over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_refresh_secret: Option<String>,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub required: Vec<RequiredVar>,
    pub default_timeout: Duration,
    pub user_agent: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(default);
    };

    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_timeout_ms(key: &str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };

    let ms: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidTimeout {
            key: key.to_string(),
            value: raw.clone(),
        })?;

    if ms == 0 {
        return Err(ConfigError::ZeroTimeout {
            key: key.to_string(),
        });
    }

    Ok(Some(Duration::from_millis(ms)))
}

impl GateConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required_keys: Vec<String> = match non_blank(lookup(REQUIRED_ENV_ENV)) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            None => DEFAULT_REQUIRED_ENV.iter().map(|k| k.to_string()).collect(),
        };

        let required = required_keys
            .into_iter()
            .map(|key| {
                let value = lookup(&key);
                RequiredVar { key, value }
            })
            .collect();

        let storage = StorageConfig {
            endpoint: non_blank(lookup(S3_ENDPOINT_ENV))
                .unwrap_or_else(|| DEFAULT_S3_ENDPOINT.to_string()),
            bucket: non_blank(lookup(S3_BUCKET_ENV)),
            critical: parse_bool(STORAGE_CRITICAL_ENV, lookup(STORAGE_CRITICAL_ENV), true)?,
        };

        let llm = LlmConfig {
            base_url: non_blank(lookup(LLM_BASE_URL_ENV))
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            api_key: non_blank(lookup(LLM_API_KEY_ENV)),
            critical: parse_bool(LLM_CRITICAL_ENV, lookup(LLM_CRITICAL_ENV), false)?,
        };

        let default_timeout = parse_timeout_ms(DEFAULT_TIMEOUT_ENV, lookup(DEFAULT_TIMEOUT_ENV))?
            .unwrap_or(DEFAULT_PROBE_TIMEOUT);

        Ok(Self {
            database_url: non_blank(lookup(DATABASE_URL_ENV)),
            jwt_secret: lookup(JWT_SECRET_ENV),
            jwt_refresh_secret: lookup(JWT_REFRESH_SECRET_ENV),
            storage,
            llm,
            required,
            default_timeout,
            user_agent: non_blank(lookup(USER_AGENT_ENV)).unwrap_or_else(default_user_agent),
        })
    }
}
