//! Typed configuration from environment variables.
//!
//! Loads once at startup. The broker block is optional: leaving
//! `REDIS_ADDR` unset disables the AI task subsystem instead of failing.
//! Sensitive values are wrapped in `secrecy::SecretString`.

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_QUEUE: &str = "celery";
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug)]
pub struct Config {
    /// `None` when no broker address is configured.
    pub broker: Option<BrokerConfig>,
    pub http_addr: String,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// Connection settings for the task broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// `host:port` or a `redis://` URL.
    pub addr: String,
    pub password: Option<SecretString>,
    pub db: i64,
    /// List key the worker consumes from.
    pub queue: String,
    /// Advisory only: the worker applies its own result expiry.
    pub result_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let broker = match var("REDIS_ADDR") {
            None => None,
            Some(addr) => Some(BrokerConfig {
                addr,
                password: var("REDIS_PASSWORD").map(SecretString::from),
                db: parse_var("REDIS_DB", var("REDIS_DB"))?.unwrap_or(0),
                queue: var("AI_QUEUE_NAME").unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
                result_ttl: parse_var::<u64>("AI_RESULT_TTL", var("AI_RESULT_TTL"))?
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RESULT_TTL),
            }),
        };

        Ok(Self {
            broker,
            http_addr: var("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            otel_endpoint: var("OTEL_ENDPOINT"),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{name} must be an integer, got {v:?}")))
        })
        .transpose()
}
