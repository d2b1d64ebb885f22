// Configuration
//
// Everything is read from environment variables (optionally seeded from a
// .env file). Parsing goes through a lookup closure so it can be tested
// without touching the process environment.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::time::Duration;

use crate::gateway::RetryPolicy;

pub const PRODUCTION_BASE_URL: &str = "https://api.acquired.com";
pub const SANDBOX_BASE_URL: &str = "https://test-api.acquired.com";

const DEFAULT_API_VERSION: &str = "1";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_TOKEN_MARGIN_SECS: u64 = 600;
const DEFAULT_HTTP_BIND_ADDR: &str = "127.0.0.1:3001";

/// Which Acquired.com deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Credentials and endpoint settings for the payment API
#[derive(Clone)]
pub struct AcquiredConfig {
    pub app_id: String,
    pub app_key: String,
    pub environment: Environment,
    pub api_version: String,
    pub base_url_override: Option<String>,
    /// Sent as the `Company-Id` header when set
    pub company_id: Option<String>,
    /// Sent as the `Mid` header when set
    pub mid: Option<String>,
    pub retry: RetryPolicy,
    pub token_margin: Duration,
}

// app_key must never reach the logs
impl fmt::Debug for AcquiredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquiredConfig")
            .field("app_id", &self.app_id)
            .field("app_key", &"***")
            .field("environment", &self.environment)
            .field("api_version", &self.api_version)
            .field("base_url_override", &self.base_url_override)
            .field("company_id", &self.company_id)
            .field("mid", &self.mid)
            .field("retry", &self.retry)
            .field("token_margin", &self.token_margin)
            .finish()
    }
}

impl AcquiredConfig {
    /// Load from the process environment after reading `.env` if present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let app_id = get("ACQUIRED_APP_ID")
            .ok_or_else(|| anyhow!("ACQUIRED_APP_ID environment variable is required"))?;
        let app_key = get("ACQUIRED_APP_KEY")
            .ok_or_else(|| anyhow!("ACQUIRED_APP_KEY environment variable is required"))?;

        let environment = match get("ACQUIRED_ENVIRONMENT").as_deref() {
            Some(value) => parse_environment(value)?,
            None if get("NODE_ENV").as_deref() == Some("production") => Environment::Production,
            None => Environment::Sandbox,
        };

        let max_retries = parse_or(&get, "ACQUIRED_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        let retry_delay_ms = parse_or(&get, "ACQUIRED_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?;
        let margin_secs = parse_or(&get, "ACQUIRED_TOKEN_MARGIN_SECS", DEFAULT_TOKEN_MARGIN_SECS)?;

        Ok(Self {
            app_id,
            app_key,
            environment,
            api_version: get("ACQUIRED_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            base_url_override: get("ACQUIRED_API_BASE_URL"),
            company_id: get("ACQUIRED_COMPANY_ID"),
            mid: get("ACQUIRED_MID"),
            retry: RetryPolicy {
                max_retries,
                base_delay: Duration::from_millis(retry_delay_ms),
            },
            token_margin: Duration::from_secs(margin_secs),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url())
    }

    /// Versioned prefix for every authenticated call, e.g. `https://.../v1`
    pub fn api_url(&self) -> String {
        format!("{}/v{}", self.base_url(), self.api_version)
    }
}

fn parse_environment(value: &str) -> Result<Environment> {
    match value.to_lowercase().as_str() {
        "sandbox" | "test" => Ok(Environment::Sandbox),
        "production" | "prod" | "live" => Ok(Environment::Production),
        other => Err(anyhow!(
            "ACQUIRED_ENVIRONMENT must be 'sandbox' or 'production', got '{}'",
            other
        )),
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Settings for the optional HTTP interface
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("HTTP_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_HTTP_BIND_ADDR.to_string()),
        }
    }
}
