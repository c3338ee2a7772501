//! Client configuration.

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default retry budget (extra attempts beyond the first).
pub const DEFAULT_RETRIES: u32 = 3;

/// Settings for one [Client](crate::Client) (one gateway, one default instance).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Gateway base URL, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Instance used when an operation gets no explicit override.
    pub instance: String,
    /// Sent as the `apikey` header.
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    /// Extra headers added to every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_verify_ssl() -> bool {
    true
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        instance: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            instance: instance.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            verify_ssl: true,
            headers: HashMap::new(),
        }
    }

    /// Load from `EVOLUTION_*` environment variables.
    ///
    /// `EVOLUTION_BASE_URL`, `EVOLUTION_INSTANCE` and `EVOLUTION_API_KEY` are
    /// required; `EVOLUTION_TIMEOUT_SECS`, `EVOLUTION_RETRIES` and
    /// `EVOLUTION_VERIFY_SSL` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingEnv(name));
        let mut config = Self::new(
            required("EVOLUTION_BASE_URL")?,
            required("EVOLUTION_INSTANCE")?,
            required("EVOLUTION_API_KEY")?,
        );
        if let Some(v) = lookup("EVOLUTION_TIMEOUT_SECS") {
            config.timeout_secs = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "EVOLUTION_TIMEOUT_SECS",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("EVOLUTION_RETRIES") {
            config.retries = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "EVOLUTION_RETRIES",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("EVOLUTION_VERIFY_SSL") {
            let flag = v.trim().to_ascii_lowercase();
            config.verify_ssl = match flag.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "EVOLUTION_VERIFY_SSL",
                        value: v,
                    })
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Base URL without trailing slashes.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries)
    }

    /// Fail fast on a base URL that is not absolute http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: reason.to_string(),
        };
        let url = reqwest::Url::parse(self.base()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, &'static str> = pairs.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn base_trims_trailing_slash() {
        let config = ClientConfig::new("https://api.example.com//", "default", "key");
        assert_eq!(config.base(), "https://api.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_urls() {
        for url in ["not a url", "ftp://example.com", ""] {
            let config = ClientConfig::new(url, "default", "key");
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidBaseUrl { .. })),
                "{url:?} should be rejected"
            );
        }
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://api.example.com",
            "instance": "main",
            "api_key": "secret"
        }))
        .unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert!(config.verify_ssl);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn from_lookup_reads_optional_values() {
        let config = ClientConfig::from_lookup(env(&[
            ("EVOLUTION_BASE_URL", "http://localhost:8080"),
            ("EVOLUTION_INSTANCE", "bot"),
            ("EVOLUTION_API_KEY", "k"),
            ("EVOLUTION_RETRIES", "5"),
            ("EVOLUTION_VERIFY_SSL", "false"),
        ]))
        .unwrap();
        assert_eq!(config.instance, "bot");
        assert_eq!(config.retries, 5);
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn from_lookup_reports_missing_and_invalid() {
        let missing = ClientConfig::from_lookup(env(&[("EVOLUTION_BASE_URL", "http://h")]));
        assert!(matches!(
            missing,
            Err(ConfigError::MissingEnv("EVOLUTION_INSTANCE"))
        ));

        let invalid = ClientConfig::from_lookup(env(&[
            ("EVOLUTION_BASE_URL", "http://h"),
            ("EVOLUTION_INSTANCE", "i"),
            ("EVOLUTION_API_KEY", "k"),
            ("EVOLUTION_RETRIES", "many"),
        ]));
        assert!(matches!(
            invalid,
            Err(ConfigError::InvalidEnv {
                name: "EVOLUTION_RETRIES",
                ..
            })
        ));
    }
}
