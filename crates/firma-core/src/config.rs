//! Client configuration

use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

pub const API_URL_VAR: &str = "FIRMA_API_URL";
pub const TIMEOUT_VAR: &str = "FIRMA_TIMEOUT_SECS";

/// Where the signature service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    /// No timeout unless set; a stalled exchange then waits forever
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read `FIRMA_API_URL` and `FIRMA_TIMEOUT_SECS` from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(API_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match lookup(TIMEOUT_VAR).filter(|t| !t.trim().is_empty()) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let config = Self { base_url, timeout };
        config.validate()?;
        Ok(config)
    }

    /// Parsed base URL; only http(s) URLs that can take path segments are accepted
    pub fn url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: reason.to_string(),
        };

        let url = Url::parse(self.base_url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path"));
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.url().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_reads_url_and_timeout() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_VAR, "https://sign.example.com/api"),
            (TIMEOUT_VAR, " 30 "),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://sign.example.com/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup_from(&[(TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(ref t) if t == "soon"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = ClientConfig::new("ftp://example.com/api").validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(ClientConfig::new("not a url").validate().is_err());
    }

    #[test]
    fn test_blank_url_falls_back_to_default() {
        let config = ClientConfig::from_lookup(lookup_from(&[(API_URL_VAR, "  ")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }
}
