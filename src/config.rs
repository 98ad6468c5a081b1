use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_INDICATOR_BASE_URL: &str = "https://mindicador.cl/api";

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Total attempts per lookup, the first one included.
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDICATOR_BASE_URL.into(),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            retry_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub indicators: IndicatorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = IndicatorConfig::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let indicators = IndicatorConfig {
            base_url: var("INDICATOR_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout: var("INDICATOR_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>().context("INDICATOR_TIMEOUT_SECS"))
                .transpose()?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_attempts: var("INDICATOR_MAX_ATTEMPTS")
                .map(|v| v.parse::<usize>().context("INDICATOR_MAX_ATTEMPTS"))
                .transpose()?
                .unwrap_or(defaults.max_attempts)
                .max(1),
            retry_delay: var("INDICATOR_RETRY_DELAY_MS")
                .map(|v| v.parse::<u64>().context("INDICATOR_RETRY_DELAY_MS"))
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            max_connections: var("DATABASE_MAX_CONNECTIONS")
                .map(|v| v.parse::<u32>().context("DATABASE_MAX_CONNECTIONS"))
                .transpose()?
                .unwrap_or(10),
            indicators,
        })
    }
}
