use crate::error::{OpsboardError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration, sourced from environment variables.
///
/// `OPSBOARD_API_TOKEN` is the only required setting; everything else has a
/// default tuned for the hosted PagerDuty-compatible API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API token (bearer-style credential)
    pub api_token: String,

    /// Account-identifying email sent in the `From` header
    pub from_email: Option<String>,

    /// Base URL of the upstream REST API
    pub api_base_url: String,

    /// TTL for cached incident lists, in seconds
    pub incidents_ttl_secs: u64,

    /// TTL for cached service lists, in seconds
    pub services_ttl_secs: u64,

    /// Interval between cache sweeper passes, in seconds
    pub sweep_interval_secs: u64,

    /// Per-request HTTP timeout, in seconds
    pub request_timeout_secs: u64,

    /// Upstream page size (records per request)
    pub page_limit: u32,

    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            from_email: None,
            api_base_url: "https://api.pagerduty.com".to_string(),
            incidents_ttl_secs: 30,
            services_ttl_secs: 300,
            sweep_interval_secs: 60,
            request_timeout_secs: 30,
            page_limit: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let api_token = env::var("OPSBOARD_API_TOKEN")
            .or_else(|_| env::var("PAGERDUTY_API_TOKEN"))
            .unwrap_or_default();

        let config = Self {
            api_token,
            from_email: env::var("OPSBOARD_FROM_EMAIL").ok().filter(|v| !v.is_empty()),
            api_base_url: env::var("OPSBOARD_API_BASE_URL").unwrap_or(defaults.api_base_url),
            incidents_ttl_secs: parse_env("OPSBOARD_INCIDENTS_TTL_SECS", defaults.incidents_ttl_secs)?,
            services_ttl_secs: parse_env("OPSBOARD_SERVICES_TTL_SECS", defaults.services_ttl_secs)?,
            sweep_interval_secs: parse_env("OPSBOARD_SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            request_timeout_secs: parse_env("OPSBOARD_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            page_limit: parse_env("OPSBOARD_PAGE_LIMIT", defaults.page_limit)?,
            log_level: env::var("OPSBOARD_LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate settings that would otherwise fail at first use.
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(OpsboardError::Configuration(
                "OPSBOARD_API_TOKEN is not set; an upstream API token is required".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(OpsboardError::Configuration(
                "OPSBOARD_API_BASE_URL must not be empty".to_string(),
            ));
        }
        if self.page_limit == 0 {
            return Err(OpsboardError::Configuration(
                "OPSBOARD_PAGE_LIMIT must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn incidents_ttl(&self) -> Duration {
        Duration::from_secs(self.incidents_ttl_secs)
    }

    pub fn services_ttl(&self) -> Duration {
        Duration::from_secs(self.services_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            OpsboardError::Configuration(format!("{key} has invalid value: {raw}"))
        }),
        Err(_) => Ok(default),
    }
}

/// Write a commented `.env.example` into the current working directory.
pub fn create_sample_env_file() -> Result<()> {
    write_sample_env(Path::new(".env.example"))?;
    println!("Wrote .env.example");
    Ok(())
}

fn write_sample_env(path: &Path) -> Result<()> {
    let sample = r#"# opsboard configuration
# Required: upstream API token (PAGERDUTY_API_TOKEN also accepted)
OPSBOARD_API_TOKEN=

# Account-identifying email for the From header (required by some endpoints)
OPSBOARD_FROM_EMAIL=

# Upstream REST API base URL
OPSBOARD_API_BASE_URL=https://api.pagerduty.com

# Cache TTLs (seconds)
OPSBOARD_INCIDENTS_TTL_SECS=30
OPSBOARD_SERVICES_TTL_SECS=300

# Cache sweeper interval (seconds)
OPSBOARD_SWEEP_INTERVAL_SECS=60

# HTTP request timeout (seconds)
OPSBOARD_REQUEST_TIMEOUT_SECS=30

# Upstream page size
OPSBOARD_PAGE_LIMIT=100

# Log level: error, warn, info, debug, trace
OPSBOARD_LOG_LEVEL=info
"#;
    std::fs::write(path, sample).map_err(|e| {
        OpsboardError::Configuration(format!("could not write {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_ttls() {
        let config = Config::default();
        assert_eq!(config.incidents_ttl_secs, 30);
        assert_eq!(config.services_ttl_secs, 300);
    }

    #[test]
    fn validate_rejects_missing_token() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, OpsboardError::Configuration(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn validate_accepts_token() {
        let config = Config {
            api_token: "u+wXyzzyToken".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_page_limit() {
        let config = Config {
            api_token: "tok".to_string(),
            page_limit: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sample_env_file_lists_every_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.example");
        write_sample_env(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        for key in [
            "OPSBOARD_API_TOKEN",
            "OPSBOARD_FROM_EMAIL",
            "OPSBOARD_API_BASE_URL",
            "OPSBOARD_INCIDENTS_TTL_SECS",
            "OPSBOARD_SERVICES_TTL_SECS",
            "OPSBOARD_SWEEP_INTERVAL_SECS",
            "OPSBOARD_REQUEST_TIMEOUT_SECS",
            "OPSBOARD_PAGE_LIMIT",
            "OPSBOARD_LOG_LEVEL",
        ] {
            assert!(contents.contains(key), "missing {key}");
        }
    }
}
